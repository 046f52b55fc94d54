// src/fetch/metadata.rs
// Repository metadata: a single GET /repos/{owner}/{repo}.

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode, MetadataRecord, ResourceFetcher, ResourceKind, ResourceRecord};
use crate::error::FetchError;
use crate::github::{GitHubClient, RepositoryRef};

#[derive(Debug, Deserialize)]
struct ApiRepository {
    full_name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
    default_branch: String,
    visibility: Option<String>,
    #[serde(default)]
    private: bool,
}

impl From<ApiRepository> for MetadataRecord {
    fn from(repo: ApiRepository) -> Self {
        // Older GitHub Enterprise servers only send `private`
        let fallback = if repo.private { "private" } else { "public" };
        let visibility = repo.visibility.unwrap_or_else(|| fallback.to_string());

        Self {
            full_name: repo.full_name,
            description: repo.description,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            default_branch: repo.default_branch,
            visibility,
        }
    }
}

pub struct MetadataFetcher;

impl MetadataFetcher {
    pub async fn fetch_metadata(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<MetadataRecord, FetchError> {
        let path = repo.api_path();
        let wrap = |cause| FetchError::new(ResourceKind::Metadata, cause);

        let body = client.get(&path, &[]).await.map_err(wrap)?;
        let api: ApiRepository = decode(body, &path).map_err(wrap)?;
        Ok(api.into())
    }
}

#[async_trait]
impl ResourceFetcher for MetadataFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Metadata
    }

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError> {
        let record = self.fetch_metadata(client, repo).await?;
        Ok(vec![ResourceRecord::Metadata(record)])
    }
}
