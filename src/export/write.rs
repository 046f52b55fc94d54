// src/export/write.rs
// =============================================================================
// Writes a rendered export to disk.
//
// File name: {owner}_{repo}_export_{YYYYmmdd_HHMMSS}.txt
//
// The text goes to "<name>.partial" first and is renamed into place once fully
// written, so an interrupted run never leaves a half-written export behind.
// =============================================================================

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::ExportDocument;
use crate::error::ExportError;
use crate::github::RepositoryRef;

pub fn export_file_name(repo: &RepositoryRef, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}_export_{}.txt",
        repo.owner,
        repo.name,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

// Writes `document` into `dir` and returns the final path
pub fn write_export(
    dir: &Path,
    document: &ExportDocument,
    timestamp: DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;

    let final_path = dir.join(export_file_name(&document.repository, timestamp));
    let partial_path = final_path.with_extension("txt.partial");

    let result = (|| {
        let mut file = fs::File::create(&partial_path)?;
        file.write_all(document.render().as_bytes())?;
        file.sync_all()?;
        fs::rename(&partial_path, &final_path)
    })();

    if let Err(e) = result {
        // Best effort: the write already failed, so a failed cleanup adds nothing
        let _ = fs::remove_file(&partial_path);
        return Err(ExportError::Io(e));
    }

    tracing::info!(path = %final_path.display(), "Export written");
    Ok(final_path)
}
