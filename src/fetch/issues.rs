// src/fetch/issues.rs
// =============================================================================
// Fetches all issues (open and closed) and the comments on each.
//
// GitHub's issues endpoint also lists pull requests; those carry a
// `pull_request` key and are skipped here because they get their own section.
// Comments are drained only for issues that report at least one.
// =============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{
    decode, login, ApiUser, CommentRecord, IssueRecord, ResourceFetcher, ResourceKind,
    ResourceRecord,
};
use crate::error::{ApiError, FetchError};
use crate::github::{drain, GitHubClient, PageRequest, RepositoryRef};

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    created_at: String,
    user: Option<ApiUser>,
    #[serde(default)]
    comments: u64,
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    body: Option<String>,
    created_at: String,
    user: Option<ApiUser>,
}

impl From<ApiComment> for CommentRecord {
    fn from(comment: ApiComment) -> Self {
        Self {
            author: login(comment.user),
            created_at: comment.created_at,
            body: comment.body,
        }
    }
}

pub struct IssuesFetcher {
    per_page: u32,
}

impl IssuesFetcher {
    pub fn new(per_page: u32) -> Self {
        Self { per_page }
    }

    async fn fetch_comments(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<CommentRecord>, ApiError> {
        let path = format!("{}/issues/{}/comments", repo.api_path(), number);
        let items = drain(client, &PageRequest::new(path.as_str(), self.per_page)).await?;

        items
            .into_iter()
            .map(|item| decode::<ApiComment>(item, &path).map(CommentRecord::from))
            .collect()
    }

    async fn fetch_issues(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, ApiError> {
        let path = format!("{}/issues", repo.api_path());
        let request = PageRequest::new(path.as_str(), self.per_page).param("state", "all");

        let mut records = Vec::new();
        for item in drain(client, &request).await? {
            let issue: ApiIssue = decode(item, &path)?;
            if issue.pull_request.is_some() {
                continue;
            }

            let comments = if issue.comments > 0 {
                self.fetch_comments(client, repo, issue.number).await?
            } else {
                Vec::new()
            };

            records.push(ResourceRecord::Issue(IssueRecord {
                number: issue.number,
                title: issue.title,
                body: issue.body,
                state: issue.state,
                created_at: issue.created_at,
                author: login(issue.user),
                comments,
            }));
        }

        tracing::debug!(%repo, count = records.len(), "Fetched issues");
        Ok(records)
    }
}

#[async_trait]
impl ResourceFetcher for IssuesFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Issues
    }

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError> {
        self.fetch_issues(client, repo)
            .await
            .map_err(|cause| FetchError::new(ResourceKind::Issues, cause))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is `pull_request` an Option<Value>?
//    - We never read what is inside it, only whether the key is present.
//      Value accepts any JSON shape, and Option makes a missing key None
//
// 2. Why `if issue.comments > 0` before draining comments?
//    - Every drain costs at least one request against the rate limit, and
//      most issues have no comments at all
// -----------------------------------------------------------------------------
