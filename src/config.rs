// src/config.rs
// =============================================================================
// Everything the exporter needs to know before it makes a request.
//
// ExportConfig is built once (by the CLI, or by a test) and handed to the
// Exporter. Nothing reads environment variables after that point; clap has
// already folded GITHUB_TOKEN and GITHUB_API_URL into the arguments.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::github::{GitHubClient, ReqwestTransport, RetryPolicy, TokioBackoff};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub's maximum page size.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub token: String,
    pub base_url: String,
    pub per_page: u32,
    /// Rate-limit retries after the first attempt
    pub max_retries: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ExportConfig {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            per_page: MAX_PER_PAGE,
            max_retries: 2,
            timeout: Duration::from_secs(30),
            user_agent: format!("repo-exporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Page size, clamped to 1..=100.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            bail!("A GitHub token is required (pass --token or set GITHUB_TOKEN)");
        }
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API URL: {}", self.base_url))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            bail!("API URL must be http(s): {}", self.base_url);
        }
        Ok(())
    }

    /// Builds the production client: reqwest transport, tokio timer.
    pub fn build_client(&self) -> Result<GitHubClient> {
        self.validate()?;
        let transport = ReqwestTransport::new(&self.user_agent, self.timeout)
            .context("Failed to create HTTP client")?;

        Ok(GitHubClient::new(
            &self.base_url,
            &self.token,
            Arc::new(transport),
            RetryPolicy::new(self.max_retries, Arc::new(TokioBackoff)),
        ))
    }
}
