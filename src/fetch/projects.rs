// src/fetch/projects.rs
// =============================================================================
// Fetches classic project boards: projects -> columns -> cards.
//
// Three levels of pagination, each drained in full before moving on:
//   GET /repos/{owner}/{repo}/projects?state=all
//   GET /projects/{project_id}/columns
//   GET /projects/columns/{column_id}/cards
//
// Cards that point at an issue or pull request keep only the reference
// (#number); their content already lives in the Issues and Pull Requests
// sections. Repositories with projects disabled answer 404 or 410, which
// surfaces as NotFound and becomes a section error upstream.
// =============================================================================

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    decode, CardRecord, ColumnRecord, ContentRef, ProjectRecord, ResourceFetcher, ResourceKind,
    ResourceRecord,
};
use crate::error::{ApiError, FetchError};
use crate::github::{drain, GitHubClient, PageRequest, RepositoryRef};

#[derive(Debug, Deserialize)]
struct ApiProject {
    id: u64,
    name: String,
    body: Option<String>,
    state: String,
}

#[derive(Debug, Deserialize)]
struct ApiColumn {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    note: Option<String>,
    content_url: Option<String>,
}

impl From<ApiCard> for CardRecord {
    fn from(card: ApiCard) -> Self {
        match (card.content_url, card.note) {
            (Some(url), _) => CardRecord::Reference(ContentRef::from_content_url(&url)),
            (None, note) => CardRecord::Note(note.unwrap_or_default()),
        }
    }
}

pub struct ProjectsFetcher {
    per_page: u32,
}

impl ProjectsFetcher {
    pub fn new(per_page: u32) -> Self {
        Self { per_page }
    }

    async fn fetch_cards(
        &self,
        client: &GitHubClient,
        column_id: u64,
    ) -> Result<Vec<CardRecord>, ApiError> {
        let path = format!("/projects/columns/{}/cards", column_id);
        let items = drain(client, &PageRequest::new(path.as_str(), self.per_page)).await?;

        items
            .into_iter()
            .map(|item| decode::<ApiCard>(item, &path).map(CardRecord::from))
            .collect()
    }

    async fn fetch_columns(
        &self,
        client: &GitHubClient,
        project_id: u64,
    ) -> Result<Vec<ColumnRecord>, ApiError> {
        let path = format!("/projects/{}/columns", project_id);
        let items = drain(client, &PageRequest::new(path.as_str(), self.per_page)).await?;

        let mut columns = Vec::with_capacity(items.len());
        for item in items {
            let column: ApiColumn = decode(item, &path)?;
            let cards = self.fetch_cards(client, column.id).await?;
            columns.push(ColumnRecord {
                name: column.name,
                cards,
            });
        }
        Ok(columns)
    }

    async fn fetch_projects(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, ApiError> {
        let path = format!("{}/projects", repo.api_path());
        let request = PageRequest::new(path.as_str(), self.per_page).param("state", "all");

        let mut records = Vec::new();
        for item in drain(client, &request).await? {
            let project: ApiProject = decode(item, &path)?;
            let columns = self.fetch_columns(client, project.id).await?;
            records.push(ResourceRecord::Project(ProjectRecord {
                name: project.name,
                body: project.body,
                state: project.state,
                columns,
            }));
        }
        Ok(records)
    }
}

#[async_trait]
impl ResourceFetcher for ProjectsFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Projects
    }

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError> {
        self.fetch_projects(client, repo)
            .await
            .map_err(|cause| FetchError::new(ResourceKind::Projects, cause))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why nested loops instead of collecting everything first?
//    - A column's cards can only be requested once we know the column id,
//      and a column only once we know its project id
//    - Each level is drained completely, so records keep the API's order
//
// 2. How does ContentRef::from_content_url work?
//    - It looks at the last two path segments of the URL, e.g.
//      ".../issues/12" -> Issue(12) and ".../pulls/7" -> PullRequest(7)
//    - Anything else is kept as a plain URL rather than dropped
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{response, test_client, ScriptedTransport};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_projects_columns_and_cards() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/projects?state=all&per_page=100&page=1",
            response(200, json!([{"id": 1, "name": "Roadmap", "body": null, "state": "open"}])),
        );
        transport.on(
            "/projects/1/columns?per_page=100&page=1",
            response(200, json!([{"id": 10, "name": "To do"}, {"id": 11, "name": "Done"}])),
        );
        transport.on(
            "/projects/columns/10/cards?per_page=100&page=1",
            response(
                200,
                json!([
                    {"note": "Write docs", "content_url": null},
                    {"note": null, "content_url": "https://api.github.com/repos/o/r/issues/3"}
                ]),
            ),
        );
        transport.on(
            "/projects/columns/11/cards?per_page=100&page=1",
            response(200, json!([])),
        );
        let client = test_client(transport);

        let records = ProjectsFetcher::new(100)
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![ResourceRecord::Project(ProjectRecord {
                name: "Roadmap".to_string(),
                body: None,
                state: "open".to_string(),
                columns: vec![
                    ColumnRecord {
                        name: "To do".to_string(),
                        cards: vec![
                            CardRecord::Note("Write docs".to_string()),
                            CardRecord::Reference(ContentRef::Issue(3)),
                        ],
                    },
                    ColumnRecord {
                        name: "Done".to_string(),
                        cards: vec![],
                    },
                ],
            })]
        );
    }

    #[tokio::test]
    async fn test_projects_gone_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/projects?state=all&per_page=100&page=1",
            response(410, json!({"message": "Projects are disabled for this repository"})),
        );
        let client = test_client(transport);

        let err = ProjectsFetcher::new(100)
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ResourceKind::Projects);
        assert!(err.cause.is_not_found());
    }
}
