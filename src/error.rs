// src/error.rs
// =============================================================================
// Error types shared by every layer of the exporter.
//
// Three levels:
// - ApiError: what a single GitHub request can fail with
// - FetchError: an ApiError tagged with the resource kind being fetched
// - ExportError: the only failures that abort a whole export
//
// Everything else (a section that could not be fetched, a binary file) is
// recorded inside the output document instead of being returned as an Err.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - Enums with data: each variant carries the details of that failure
// =============================================================================

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::fetch::ResourceKind;

// Errors from a single (possibly retried) GitHub API request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The rate limit was still exhausted after every allowed retry
    #[error("rate limit exceeded after {attempts} attempt(s), resets at {reset_at}")]
    RateLimited {
        reset_at: DateTime<Utc>,
        attempts: u32,
    },

    /// 404 Not Found or 410 Gone
    #[error("not found: {url}")]
    NotFound { url: String },

    /// 401, or 403 without rate-limit headers
    #[error("unauthorized (HTTP {status}): {url}")]
    Unauthorized { status: u16, url: String },

    /// Connection-level failure (DNS, TLS, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success status
    #[error("unexpected HTTP {status} from {url}: {message}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        message: String,
    },

    /// The body was not the JSON shape we expected
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A pagination link pointed away from the API host; the token is never
    /// sent there
    #[error("refusing to follow {url}: not on {base_url}")]
    ForeignUrl { url: String, base_url: String },
}

impl ApiError {
    /// True when the error means the token itself is rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

// A failed resource fetch: which section, and why
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} fetch failed: {cause}")]
pub struct FetchError {
    pub kind: ResourceKind,
    #[source]
    pub cause: ApiError,
}

impl FetchError {
    pub fn new(kind: ResourceKind, cause: ApiError) -> Self {
        Self { kind, cause }
    }
}

// Failures that stop the export before any output is written
#[derive(Debug, Error)]
pub enum ExportError {
    /// Repository metadata could not be fetched (bad token, missing repo, offline)
    #[error("could not read repository metadata: {0}")]
    Metadata(#[source] FetchError),

    /// The token was rejected while fetching a later section
    #[error("token rejected while exporting {}: {}", .0.kind, .0.cause)]
    Unauthorized(#[source] FetchError),

    /// Writing the output file failed
    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
}
