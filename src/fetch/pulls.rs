// src/fetch/pulls.rs
// Pull requests, open and closed. The list endpoint reports merges through
// `merged_at`, so no per-PR request is needed.

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode, login, ApiUser, PullRequestRecord, ResourceFetcher, ResourceKind, ResourceRecord};
use crate::error::{ApiError, FetchError};
use crate::github::{drain, GitHubClient, PageRequest, RepositoryRef};

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    created_at: String,
    merged_at: Option<String>,
    user: Option<ApiUser>,
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            body: pr.body,
            state: pr.state,
            merged: pr.merged_at.is_some(),
            created_at: pr.created_at,
            author: login(pr.user),
        }
    }
}

pub struct PullRequestsFetcher {
    per_page: u32,
}

impl PullRequestsFetcher {
    pub fn new(per_page: u32) -> Self {
        Self { per_page }
    }

    async fn fetch_pulls(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, ApiError> {
        let path = format!("{}/pulls", repo.api_path());
        let request = PageRequest::new(path.as_str(), self.per_page).param("state", "all");

        drain(client, &request)
            .await?
            .into_iter()
            .map(|item| {
                decode::<ApiPullRequest>(item, &path)
                    .map(|pr| ResourceRecord::PullRequest(pr.into()))
            })
            .collect()
    }
}

#[async_trait]
impl ResourceFetcher for PullRequestsFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PullRequests
    }

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError> {
        self.fetch_pulls(client, repo)
            .await
            .map_err(|cause| FetchError::new(ResourceKind::PullRequests, cause))
    }
}
