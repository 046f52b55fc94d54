// src/fetch/files.rs
// =============================================================================
// Fetches every file of the repository's default branch.
//
// Strategy:
// - Ask for the recursive git tree of `main`; if that branch does not exist
//   (NotFound), ask for `master` instead, exactly once
// - Keep only "blob" entries (skip directories and submodule commits)
// - Fetch each blob by SHA and decode its base64 payload
// - Text files keep their content; binary files become a placeholder
//
// A binary file, or a blob that has vanished, never fails the section. Every
// other error (rate limit, token, network) does.
//
// Rust concepts:
// - base64::Engine: decoding GitHub's line-wrapped base64
// - String::from_utf8: fails on invalid UTF-8 instead of guessing
// =============================================================================

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use super::{decode, FileContent, FileRecord, ResourceFetcher, ResourceKind, ResourceRecord};
use crate::error::{ApiError, FetchError};
use crate::github::{GitHubClient, RepositoryRef};

/// Branches tried, in order, when looking up the tree.
pub const BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

/// How far into a file we look for NUL bytes.
const BINARY_SNIFF_LEN: usize = 8000;

#[derive(Debug, Deserialize)]
struct ApiTree {
    tree: Vec<ApiTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiBlob {
    content: String,
    encoding: String,
}

pub struct FilesFetcher;

impl FilesFetcher {
    // Returns the tree of the first candidate branch that exists
    async fn fetch_tree(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<ApiTree, ApiError> {
        let mut last_error = None;

        for branch in BRANCH_CANDIDATES {
            let path = format!("{}/git/trees/{}", repo.api_path(), branch);
            match client.get(&path, &[("recursive", "1".to_string())]).await {
                Ok(body) => {
                    tracing::debug!(%branch, "Found tree");
                    return decode(body, &path);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(%branch, "No such branch, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::NotFound {
            url: format!("{}/git/trees", repo.api_path()),
        }))
    }

    async fn fetch_blob(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
        entry: &ApiTreeEntry,
    ) -> Result<FileRecord, ApiError> {
        let path = format!("{}/git/blobs/{}", repo.api_path(), entry.sha);

        let blob: ApiBlob = match client.get(&path, &[]).await {
            Ok(body) => decode(body, &path)?,
            Err(e) if e.is_not_found() => {
                tracing::warn!(file = %entry.path, "Blob not found, recording placeholder");
                return Ok(FileRecord {
                    path: entry.path.clone(),
                    encoding: String::new(),
                    content: FileContent::Unavailable {
                        reason: e.to_string(),
                    },
                });
            }
            Err(e) => return Err(e),
        };

        let content = decode_content(&blob.content, &blob.encoding);
        if let FileContent::Binary { size } = content {
            tracing::debug!(file = %entry.path, size, "Skipping binary file");
        }

        Ok(FileRecord {
            path: entry.path.clone(),
            encoding: blob.encoding,
            content,
        })
    }
}

#[async_trait]
impl ResourceFetcher for FilesFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Files
    }

    async fn fetch(
        &self,
        client: &GitHubClient,
        repo: &RepositoryRef,
    ) -> Result<Vec<ResourceRecord>, FetchError> {
        let wrap = |cause| FetchError::new(ResourceKind::Files, cause);

        let tree = self.fetch_tree(client, repo).await.map_err(wrap)?;
        if tree.truncated {
            tracing::warn!(%repo, "Tree listing was truncated by GitHub, some files are missing");
        }

        let mut records = Vec::new();
        for entry in tree.tree.iter().filter(|e| e.kind == "blob") {
            let record = self.fetch_blob(client, repo, entry).await.map_err(wrap)?;
            records.push(ResourceRecord::File(record));
        }

        Ok(records)
    }
}

// Turns a blob payload into text, or a binary placeholder
pub fn decode_content(content: &str, encoding: &str) -> FileContent {
    let bytes = if encoding.eq_ignore_ascii_case("base64") {
        // GitHub wraps base64 at 60 columns
        let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        match STANDARD.decode(compact) {
            Ok(bytes) => bytes,
            Err(e) => {
                return FileContent::Unavailable {
                    reason: format!("invalid base64 payload: {}", e),
                }
            }
        }
    } else {
        content.as_bytes().to_vec()
    };

    let size = bytes.len();
    let sniff = &bytes[..size.min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return FileContent::Binary { size };
    }

    match String::from_utf8(bytes) {
        Ok(text) => FileContent::Text(text),
        Err(_) => FileContent::Binary { size },
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `use base64::Engine as _`?
//    - decode() is a method of the Engine trait, so the trait must be in scope
//    - `as _` imports it without giving it a name we could clash with
//
// 2. Why sniff for a NUL byte before trying UTF-8?
//    - A NUL byte is valid UTF-8, so String::from_utf8 would accept it
//    - Real text files practically never contain one; images and archives do
//
// 3. What happens to `bytes` in String::from_utf8(bytes)?
//    - It is moved in. On success the String reuses the same buffer, so
//      large files are not copied a second time
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{response, test_client, ScriptedTransport};
    use serde_json::json;
    use std::sync::Arc;

    fn b64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    fn blob(bytes: &[u8]) -> serde_json::Value {
        json!({"content": b64(bytes), "encoding": "base64"})
    }

    fn tree(entries: serde_json::Value) -> serde_json::Value {
        json!({"sha": "root", "tree": entries, "truncated": false})
    }

    #[test]
    fn test_decode_text_with_line_wrapping() {
        let encoded = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(
            decode_content(encoded, "base64"),
            FileContent::Text("hello world".to_string())
        );
    }

    #[test]
    fn test_decode_invalid_utf8_is_binary() {
        let bytes = [0xff, 0xfe, 0x41, 0x42];
        assert_eq!(
            decode_content(&b64(&bytes), "base64"),
            FileContent::Binary { size: 4 }
        );
    }

    #[test]
    fn test_decode_nul_bytes_is_binary() {
        let bytes = b"PNG\0\0\0valid ascii otherwise";
        assert!(matches!(
            decode_content(&b64(bytes), "base64"),
            FileContent::Binary { .. }
        ));
    }

    #[test]
    fn test_decode_utf8_encoding_passthrough() {
        assert_eq!(
            decode_content("plain", "utf-8"),
            FileContent::Text("plain".to_string())
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_master_exactly_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/git/trees/master?recursive=1",
            response(
                200,
                tree(json!([{"path": "README.md", "type": "blob", "sha": "a1"}])),
            ),
        );
        transport.on("/repos/o/r/git/blobs/a1", response(200, blob(b"# Hello\n")));
        let client = test_client(transport.clone());

        let records = FilesFetcher
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap();

        assert_eq!(
            transport.request_keys(),
            vec![
                "/repos/o/r/git/trees/main?recursive=1",
                "/repos/o/r/git/trees/master?recursive=1",
                "/repos/o/r/git/blobs/a1"
            ]
        );
        assert_eq!(
            records,
            vec![ResourceRecord::File(FileRecord {
                path: "README.md".to_string(),
                encoding: "base64".to_string(),
                content: FileContent::Text("# Hello\n".to_string()),
            })]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_master_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = test_client(transport.clone());

        let err = FilesFetcher
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ResourceKind::Files);
        assert!(err.cause.is_not_found());
        assert_eq!(transport.count("/repos/o/r/git/trees/master?recursive=1"), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_binary_file_becomes_placeholder_and_fetch_continues() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/git/trees/main?recursive=1",
            response(
                200,
                tree(json!([
                    {"path": "logo.png", "type": "blob", "sha": "b1"},
                    {"path": "src", "type": "tree", "sha": "t1"},
                    {"path": "src/lib.rs", "type": "blob", "sha": "b2"},
                    {"path": "vendor/sub", "type": "commit", "sha": "c1"}
                ])),
            ),
        );
        transport.on("/repos/o/r/git/blobs/b1", response(200, blob(&[0x89, 0x50, 0xff, 0x00])));
        transport.on("/repos/o/r/git/blobs/b2", response(200, blob(b"pub fn f() {}\n")));
        let client = test_client(transport.clone());

        let records = FilesFetcher
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        match &records[0] {
            ResourceRecord::File(file) => {
                assert_eq!(file.path, "logo.png");
                assert_eq!(file.content, FileContent::Binary { size: 4 });
            }
            other => panic!("unexpected record {:?}", other),
        }
        match &records[1] {
            ResourceRecord::File(file) => {
                assert_eq!(file.content, FileContent::Text("pub fn f() {}\n".to_string()));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_blob_is_placeholder() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/git/trees/main?recursive=1",
            response(200, tree(json!([{"path": "gone.txt", "type": "blob", "sha": "dead"}]))),
        );
        let client = test_client(transport);

        let records = FilesFetcher
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap();

        assert!(matches!(
            &records[0],
            ResourceRecord::File(FileRecord { content: FileContent::Unavailable { .. }, .. })
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_tree_does_not_fall_back() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r/git/trees/main?recursive=1",
            response(401, json!({"message": "Bad credentials"})),
        );
        let client = test_client(transport.clone());

        let err = FilesFetcher
            .fetch(&client, &RepositoryRef::new("o", "r"))
            .await
            .unwrap_err();

        assert!(err.cause.is_unauthorized());
        assert_eq!(transport.requests().len(), 1);
    }
}
