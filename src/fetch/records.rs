// src/fetch/records.rs
// =============================================================================
// Normalized records, one type per resource kind.
//
// The fetchers turn GitHub's JSON into these types; the export module turns
// these types into text. Nothing else ever sees raw JSON, and a match over
// ResourceRecord is checked by the compiler to cover every kind.
// =============================================================================

/// One normalized API entity, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRecord {
    Metadata(MetadataRecord),
    File(FileRecord),
    Issue(IssueRecord),
    PullRequest(PullRequestRecord),
    Project(ProjectRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub full_name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub default_branch: String,
    pub visibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    /// Encoding reported by the blob API ("base64" or "utf-8")
    pub encoding: String,
    pub content: FileContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Decoded UTF-8 text
    Text(String),
    /// Not valid UTF-8 (or contains NUL bytes); only the size is kept
    Binary { size: usize },
    /// The blob could not be read; the reason is kept for the placeholder
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub created_at: String,
    pub author: String,
    /// In original post order
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub author: String,
    pub created_at: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub merged: bool,
    pub created_at: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub name: String,
    pub body: Option<String>,
    pub state: String,
    pub columns: Vec<ColumnRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    pub name: String,
    pub cards: Vec<CardRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardRecord {
    /// A free-text note card
    Note(String),
    /// A card pointing at an issue or pull request
    Reference(ContentRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Issue(u64),
    PullRequest(u64),
    /// A content URL we could not map to an issue or pull request number
    Url(String),
}

impl ContentRef {
    // Maps ".../repos/o/r/issues/12" or ".../pulls/12" to a typed reference
    pub fn from_content_url(url: &str) -> Self {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let number = segments.next().and_then(|n| n.parse::<u64>().ok());
        let collection = segments.next();

        match (collection, number) {
            (Some("issues"), Some(n)) => ContentRef::Issue(n),
            (Some("pulls"), Some(n)) => ContentRef::PullRequest(n),
            _ => ContentRef::Url(url.to_string()),
        }
    }
}
