// src/fetch/mod.rs
// =============================================================================
// Resource fetchers: one per kind of thing we export.
//
// Submodules:
// - metadata: the repository itself (one request)
// - files: the git tree of the default branch and every blob in it
// - issues: issues and their comments
// - pulls: pull requests
// - projects: classic project boards, their columns and cards
// - records: the normalized types all of the above produce
//
// Every fetcher implements ResourceFetcher, so the export module can walk
// them in a fixed order without caring which is which.
//
// Rust concepts:
// - Trait objects: Vec<Box<dyn ResourceFetcher>>
// - serde::Deserialize: private structs mirror just the JSON fields we need
// =============================================================================

mod files;
mod issues;
mod metadata;
mod projects;
mod pulls;
mod records;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, FetchError};
use crate::github::{GitHubClient, RepositoryRef};

pub use files::FilesFetcher;
pub use issues::IssuesFetcher;
pub use metadata::MetadataFetcher;
pub use projects::ProjectsFetcher;
pub use pulls::PullRequestsFetcher;
pub use records::{
    CardRecord, ColumnRecord, CommentRecord, ContentRef, FileContent, FileRecord, IssueRecord,
    MetadataRecord, ProjectRecord, PullRequestRecord, ResourceRecord,
};

// The five resource kinds, in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Metadata,
    Files,
    Issues,
    PullRequests,
    Projects,
}

impl ResourceKind {
    /// Section order of every export document.
    pub const ORDER: [ResourceKind; 5] = [
        ResourceKind::Metadata,
        ResourceKind::Files,
        ResourceKind::Issues,
        ResourceKind::PullRequests,
        ResourceKind::Projects,
    ];

    /// The name used in the `=== <Section Name> ===` delimiter.
    pub fn section_name(self) -> &'static str {
        match self {
            ResourceKind::Metadata => "Metadata",
            ResourceKind::Files => "Files",
            ResourceKind::Issues => "Issues",
            ResourceKind::PullRequests => "Pull Requests",
            ResourceKind::Projects => "Projects",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_name())
    }
}

// Fetches one resource family and normalizes it
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError>;
}

// The fetcher responsible for one section
pub fn fetcher_for(kind: ResourceKind, per_page: u32) -> Box<dyn ResourceFetcher> {
    match kind {
        ResourceKind::Metadata => Box::new(MetadataFetcher),
        ResourceKind::Files => Box::new(FilesFetcher),
        ResourceKind::Issues => Box::new(IssuesFetcher::new(per_page)),
        ResourceKind::PullRequests => Box::new(PullRequestsFetcher::new(per_page)),
        ResourceKind::Projects => Box::new(ProjectsFetcher::new(per_page)),
    }
}

// The fetchers that follow metadata, in section order.
// Metadata is fetched on its own first because its failure is fatal.
pub fn section_fetchers(per_page: u32) -> Vec<Box<dyn ResourceFetcher>> {
    ResourceKind::ORDER
        .iter()
        .filter(|kind| **kind != ResourceKind::Metadata)
        .map(|kind| fetcher_for(*kind, per_page))
        .collect()
}

// Converts a JSON value into one of the private API structs
fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        url: what.to_string(),
        message: e.to_string(),
    })
}

// GitHub sends `"user": null` for deleted accounts
#[derive(Debug, serde::Deserialize)]
struct ApiUser {
    login: String,
}

fn login(user: Option<ApiUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string())
}
