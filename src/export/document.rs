// src/export/document.rs
// =============================================================================
// The export document and its text format.
//
// Output layout (downstream tools split on the section lines):
//
//   === Metadata ===
//   Repository: octo/hello
//   ...
//
//   === Files ===
//   === File: README.md ===
//   # Hello
//
//   === Issues ===
//   ...
//
// Each section opens with a line of the exact form `=== <Section Name> ===`.
// Records are separated by a blank line. An empty section says `(none)`; a
// section that failed says `[error] <Section Name> export failed: <cause>`.
//
// Rendering is a pure function of the records, so two exports of an
// unchanged repository produce identical text.
//
// Record headers (`=== File: ... ===`, `=== Issue #n: ... ===`) share the
// `=== ... ===` shape, and file contents are written verbatim, so a file may
// itself contain a line like `=== Issues ===`. Only the five section names
// below are section lines, and they always appear in ResourceKind::ORDER.
// A reader should look for the next expected section name, not for any
// `===` line.
//
// Rust concepts:
// - std::fmt::Write: writeln! into a String, same as into a file
// - Enums with data: SectionOutcome is either rendered records or a note
// =============================================================================

use std::fmt::Write as _;

use crate::fetch::{
    CardRecord, ContentRef, FileContent, FileRecord, IssueRecord, MetadataRecord, ProjectRecord,
    PullRequestRecord, ResourceKind, ResourceRecord,
};
use crate::github::RepositoryRef;

// What a section ended up holding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Serialized records, in fetch order
    Records(Vec<String>),
    /// The inline error note for a section whose fetch failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: ResourceKind,
    pub outcome: SectionOutcome,
}

impl Section {
    pub fn from_records(kind: ResourceKind, records: &[ResourceRecord]) -> Self {
        Self {
            kind,
            outcome: SectionOutcome::Records(records.iter().map(render_record).collect()),
        }
    }

    pub fn failed(kind: ResourceKind, cause: &dyn std::fmt::Display) -> Self {
        Self {
            kind,
            outcome: SectionOutcome::Failed(format!(
                "[error] {} export failed: {}",
                kind.section_name(),
                cause
            )),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SectionOutcome::Failed(_))
    }

    /// Number of records, or None for a failed section.
    pub fn record_count(&self) -> Option<usize> {
        match &self.outcome {
            SectionOutcome::Records(records) => Some(records.len()),
            SectionOutcome::Failed(_) => None,
        }
    }

    /// The section body, without its header line.
    pub fn body(&self) -> String {
        match &self.outcome {
            SectionOutcome::Records(records) if records.is_empty() => "(none)\n".to_string(),
            SectionOutcome::Records(records) => records.join("\n"),
            SectionOutcome::Failed(note) => format!("{}\n", note),
        }
    }

    pub fn render(&self) -> String {
        format!("=== {} ===\n{}", self.kind.section_name(), self.body())
    }
}

// An ordered list of sections for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub repository: RepositoryRef,
    sections: Vec<Section>,
}

impl ExportDocument {
    pub fn new(repository: RepositoryRef) -> Self {
        Self {
            repository,
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Kinds whose section holds an error note.
    pub fn failed_sections(&self) -> Vec<ResourceKind> {
        self.sections
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.kind)
            .collect()
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(Section::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Serializes one record. Every block ends with a newline.
//
// `let _ = writeln!(...)` below: writing into a String cannot fail, but
// writeln! still returns a fmt::Result, so we discard it explicitly.
pub fn render_record(record: &ResourceRecord) -> String {
    match record {
        ResourceRecord::Metadata(meta) => render_metadata(meta),
        ResourceRecord::File(file) => render_file(file),
        ResourceRecord::Issue(issue) => render_issue(issue),
        ResourceRecord::PullRequest(pr) => render_pull_request(pr),
        ResourceRecord::Project(project) => render_project(project),
    }
}

fn render_metadata(meta: &MetadataRecord) -> String {
    format!(
        "Repository: {}\nDescription: {}\nCreated: {}\nLast Updated: {}\nDefault Branch: {}\nVisibility: {}\n",
        meta.full_name,
        meta.description.as_deref().unwrap_or("None"),
        meta.created_at,
        meta.updated_at,
        meta.default_branch,
        meta.visibility,
    )
}

fn render_file(file: &FileRecord) -> String {
    let content = match &file.content {
        FileContent::Text(text) => text.clone(),
        FileContent::Binary { size } => {
            format!("[binary file omitted: {} bytes, {}]", size, file.encoding)
        }
        FileContent::Unavailable { reason } => format!("[file unavailable: {}]", reason),
    };
    format!("=== File: {} ===\n{}", file.path, with_newline(content))
}

fn render_issue(issue: &IssueRecord) -> String {
    let mut out = format!("=== Issue #{}: {} ===\n", issue.number, issue.title);
    let _ = writeln!(out, "State: {}", issue.state);
    let _ = writeln!(out, "Created: {}", issue.created_at);
    let _ = writeln!(out, "Author: {}", issue.author);
    let _ = writeln!(out, "Description:");
    out.push_str(&with_newline(description(&issue.body)));

    for comment in &issue.comments {
        let _ = writeln!(out, "\nComment by {} on {}:", comment.author, comment.created_at);
        out.push_str(&with_newline(description(&comment.body)));
    }
    out
}

fn render_pull_request(pr: &PullRequestRecord) -> String {
    let mut out = format!("=== Pull Request #{}: {} ===\n", pr.number, pr.title);
    let _ = writeln!(out, "State: {}", pr.state);
    let _ = writeln!(out, "Merged: {}", if pr.merged { "yes" } else { "no" });
    let _ = writeln!(out, "Created: {}", pr.created_at);
    let _ = writeln!(out, "Author: {}", pr.author);
    let _ = writeln!(out, "Description:");
    out.push_str(&with_newline(description(&pr.body)));
    out
}

fn render_project(project: &ProjectRecord) -> String {
    let mut out = format!("=== Project: {} ===\n", project.name);
    let _ = writeln!(out, "State: {}", project.state);
    if let Some(body) = project.body.as_deref().filter(|b| !b.trim().is_empty()) {
        let _ = writeln!(out, "Description: {}", body.trim_end());
    }

    for column in &project.columns {
        let _ = writeln!(out, "--- Column: {} ---", column.name);
        if column.cards.is_empty() {
            out.push_str("(no cards)\n");
        }
        for card in &column.cards {
            let _ = writeln!(out, "- {}", render_card(card));
        }
    }
    out
}

fn render_card(card: &CardRecord) -> String {
    match card {
        // Continuation lines are indented so each card stays one list item
        CardRecord::Note(note) => note.trim_end().replace('\n', "\n  "),
        CardRecord::Reference(ContentRef::Issue(n)) => format!("[Issue #{}]", n),
        CardRecord::Reference(ContentRef::PullRequest(n)) => format!("[Pull Request #{}]", n),
        CardRecord::Reference(ContentRef::Url(url)) => format!("[{}]", url),
    }
}

fn description(body: &Option<String>) -> String {
    match body.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => "(no description)".to_string(),
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why render records when the Section is built, not at the end?
//    - A Section then owns plain Strings; the records themselves can be
//      dropped as soon as each fetcher finishes
//
// 2. What does `.as_deref()` do on Option<String>?
//    - It turns &Option<String> into Option<&str> without cloning, so we can
//      compare or print it and fall back with unwrap_or("None")
// -----------------------------------------------------------------------------
