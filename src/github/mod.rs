// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Submodules:
// - client: authenticated GET requests, rate-limit waits, error mapping
// - paginate: draining paginated collections page by page
// - repo: the owner/name pair identifying a repository
//
// Nothing here knows about issues, files or projects. The fetch module
// builds on these pieces for each resource kind.
// =============================================================================

mod client;
mod paginate;
mod repo;

#[cfg(test)]
pub mod testing;

pub use client::{GitHubClient, ReqwestTransport, RetryPolicy, TokioBackoff};
pub use paginate::{drain, PageRequest};
pub use repo::RepositoryRef;
