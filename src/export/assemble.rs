// src/export/assemble.rs
// =============================================================================
// Runs the fetchers in section order and builds the ExportDocument.
//
// Failure policy:
// 1. Metadata goes first. If it fails for any reason the export stops, since a
//    missing repository, a dead token or no network means nothing else can work
// 2. A later section that fails with Unauthorized (401, or a 403 that is not a
//    rate limit) also stops the export. Nothing is written in that case
// 3. Any other failure (NotFound for a disabled feature, a rate limit that
//    outlasted its retries, a dropped connection) is written into that section
//    as an error note and the remaining sections still run
//
// Requests are strictly one after another; no two fetchers ever run at once.
//
// Rust concepts:
// - Box<dyn Trait>: the fetchers and the progress sink are trait objects
// - Match guards: `Err(e) if ...` picks the fatal errors out before the
//   catch-all arm
// =============================================================================

use crate::error::{ExportError, FetchError};
use crate::fetch::{section_fetchers, MetadataFetcher, ResourceFetcher, ResourceKind, ResourceRecord};
use crate::github::{GitHubClient, RepositoryRef};
use crate::progress::ProgressSink;

use super::{ExportDocument, Section};

pub struct Exporter {
    client: GitHubClient,
    fetchers: Vec<Box<dyn ResourceFetcher>>,
    progress: Box<dyn ProgressSink>,
}

impl Exporter {
    pub fn new(client: GitHubClient, per_page: u32, progress: Box<dyn ProgressSink>) -> Self {
        Self {
            client,
            fetchers: section_fetchers(per_page),
            progress,
        }
    }

    pub async fn assemble(&self, repo: &RepositoryRef) -> Result<ExportDocument, ExportError> {
        let mut document = ExportDocument::new(repo.clone());

        // Step 1: metadata, fail-fast
        self.progress.section_started(ResourceKind::Metadata);
        let metadata = match MetadataFetcher.fetch(&self.client, repo).await {
            Ok(records) => Section::from_records(ResourceKind::Metadata, &records),
            Err(e) => {
                tracing::error!(%repo, error = %e, "Metadata fetch failed, aborting export");
                return Err(ExportError::Metadata(e));
            }
        };
        self.progress
            .section_finished(ResourceKind::Metadata, &metadata.outcome);
        document.push(metadata);

        // Step 2: every other section, in export order
        for fetcher in &self.fetchers {
            let kind = fetcher.kind();
            self.progress.section_started(kind);

            let section = match fetcher.fetch(&self.client, repo).await {
                Ok(records) => section_from(kind, &records),
                Err(e) if is_fatal(&e) => {
                    tracing::error!(section = %kind, error = %e, "Token rejected, aborting export");
                    return Err(ExportError::Unauthorized(e));
                }
                // Degrade: record the failure in place of the records
                Err(e) => {
                    tracing::warn!(section = %kind, error = %e.cause, "Section failed, continuing");
                    Section::failed(kind, &e.cause)
                }
            };

            self.progress.section_finished(kind, &section.outcome);
            document.push(section);
        }

        Ok(document)
    }
}

fn section_from(kind: ResourceKind, records: &[ResourceRecord]) -> Section {
    tracing::info!(section = %kind, records = records.len(), "Section exported");
    Section::from_records(kind, records)
}

// A rejected token is fatal wherever it shows up
fn is_fatal(error: &FetchError) -> bool {
    error.cause.is_unauthorized()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is metadata not part of `self.fetchers`?
//    - Its failure policy is different (always fatal), so it gets its own
//      step instead of a flag inside the loop
//
// 2. What does `return Err(...)` inside the for loop do?
//    - It leaves assemble() immediately; the partly built document is
//      dropped and nothing is written
//
// 3. Why `&e.cause` in Section::failed?
//    - The note already names the section, so only the underlying ApiError
//      is printed after it
// -----------------------------------------------------------------------------
