// src/github/paginate.rs
// =============================================================================
// Drains paginated GitHub collections into one Vec, in API order.
//
// How it works:
// 1. Request page 1 with `per_page` and `page` query parameters
// 2. Append the page's items to the result
// 3. Stop if the page was short (fewer items than per_page)
// 4. Otherwise follow the Link header's rel="next" URL when the response has
//    a Link header (stop when it has no "next"), or ask for page + 1 when it
//    has none
//
// Any error mid-drain fails the whole drain. Callers decide whether to start
// over; half a collection is never returned.
//
// Page numbers only ever go up, so counting pages can't revisit one. Link
// headers are different: a misbehaving server could point "next" back at a
// page we already have, so every followed link is remembered.
//
// Rust concepts:
// - Pattern matching on serde_json::Value to insist on a JSON array
// - HashSet: remembers every Link URL we followed
// - Option::take(): moves the next URL out, leaving None behind
// =============================================================================

use std::collections::HashSet;

use serde_json::Value;

use super::client::GitHubClient;
use crate::error::ApiError;

// One paginated collection to drain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub path: String,
    /// Fixed parameters sent with every page (e.g. state=all)
    pub params: Vec<(&'static str, String)>,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(path: impl Into<String>, per_page: u32) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            per_page: per_page.max(1),
        }
    }

    /// Add a fixed query parameter.
    pub fn param(mut self, key: &'static str, value: &str) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    // Fixed params first, then per_page and page
    fn query_for(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = self.params.clone();
        query.push(("per_page", self.per_page.to_string()));
        query.push(("page", page.to_string()));
        query
    }
}

// Fetches every page of `request` and returns all items in arrival order
pub async fn drain(client: &GitHubClient, request: &PageRequest) -> Result<Vec<Value>, ApiError> {
    let mut items = Vec::new();
    let mut followed = HashSet::new();
    let mut page = 1u32;
    let mut next_url: Option<String> = None;

    loop {
        // A Link URL already carries every query parameter
        let response = match next_url.take() {
            Some(url) => {
                followed.insert(url.clone());
                client.get_page(&url, &[]).await?
            }
            None => client.get_page(&request.path, &request.query_for(page)).await?,
        };

        let batch = match response.body {
            Value::Array(batch) => batch,
            _ => {
                return Err(ApiError::Decode {
                    url: response.url,
                    message: "expected a JSON array page".to_string(),
                })
            }
        };

        let count = batch.len();
        items.extend(batch);
        tracing::debug!(path = %request.path, page, count, total = items.len(), "Fetched page");

        if count < request.per_page as usize {
            break;
        }

        page += 1;
        // No Link header: fall through and ask for the next page number
        if let Some(link) = response.link.as_deref() {
            match next_link(link) {
                Some(url) if !followed.contains(&url) => next_url = Some(url),
                Some(url) => {
                    tracing::warn!(%url, "Link header points at a page already fetched, stopping");
                    break;
                }
                None => break,
            }
        }
    }

    Ok(items)
}

// Extracts the rel="next" URL from a GitHub Link header
//
// Link headers look like:
//   <https://api.github.com/repos/o/r/issues?page=2>; rel="next", <...?page=5>; rel="last"
pub fn next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut url = None;
        let mut is_next = false;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"').split_whitespace().any(|r| r == "next");
            }
        }

        if let (Some(url), true) = (url, is_next) {
            return Some(url.to_string());
        }
    }
    None
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `loop` with `break` instead of `while`?
//    - The stop decision needs the page we just fetched, which only exists
//      inside the loop body
//
// 2. Why does every error end the whole drain?
//    - Returning half a list would look like a complete one to the caller;
//      the `?` operator hands the error up and drops `items`
// -----------------------------------------------------------------------------
