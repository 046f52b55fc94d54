// src/github/repo.rs
// =============================================================================
// Identifies the repository being exported.
//
// Supported formats:
//   - owner/repo
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo
// =============================================================================

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

// Owner and name of a repository. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// API path prefix: /repos/{owner}/{name}
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        parse_repository(input)
    }
}

// Parses "owner/repo" or a GitHub URL into a RepositoryRef
//
// Example:
//   "https://github.com/rust-lang/rust" -> rust-lang/rust
fn parse_repository(input: &str) -> Result<RepositoryRef> {
    let trimmed = input.trim();
    let is_url = trimmed.starts_with("https://") || trimmed.starts_with("http://");

    // Remove common prefixes
    let stripped = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let path = match stripped.strip_prefix("github.com/") {
        Some(rest) => rest,
        None if is_url => return Err(anyhow!("Not a GitHub URL: {}", input)),
        None => {
            // A bare "owner/repo" must have exactly two segments
            if stripped.trim_end_matches('/').split('/').count() != 2 {
                return Err(anyhow!(
                    "Invalid repository format: {} (expected owner/repo)",
                    input
                ));
            }
            stripped
        }
    };

    let mut parts = path.trim_end_matches('/').split('/');
    let owner = parts.next().unwrap_or_default();
    // Remove .git suffix if present
    let name = parts.next().unwrap_or_default().trim_end_matches(".git");

    if owner.is_empty() || name.is_empty() {
        return Err(anyhow!(
            "Invalid repository format: {} (expected owner/repo)",
            input
        ));
    }

    Ok(RepositoryRef::new(owner, name))
}
