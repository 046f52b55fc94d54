// src/export/mod.rs
// =============================================================================
// Turns fetched records into the final text archive.
//
// Submodules:
// - assemble: runs the fetchers in order and collects sections
// - document: the section/record model and its text rendering
// - write: file naming and the all-or-nothing write to disk
// =============================================================================

mod assemble;
mod document;
mod write;

pub use assemble::Exporter;
pub use document::{ExportDocument, Section, SectionOutcome};
pub use write::write_export;
