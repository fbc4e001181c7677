//! Meeting summary export.
//!
//! Renders the summary markdown into `MeetingSummary_{meeting_id}.pdf`
//! in the user's download directory, falling back to the documents
//! directory when no download directory exists.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

pub(crate) mod markdown;
mod pdf;

#[derive(Error, Debug)]
pub(crate) enum ExportError {
    #[error("No download or documents directory available")]
    NoExportDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PDF rendering failed: {0}")]
    Render(#[from] anyhow::Error),
}

/// Render the summary to a PDF and return the path it was written to.
///
/// A fenced-code wrapper around the whole summary is stripped before
/// rendering so the document never shows fence markers.
pub(crate) fn export_summary(meeting_id: &str, summary: &str) -> Result<PathBuf, ExportError> {
    let dir = export_dir().ok_or(ExportError::NoExportDir)?;
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(summary_filename(meeting_id));
    let content = markdown::strip_code_fence(summary);
    pdf::write_summary_pdf(&path, meeting_id, &content)?;

    info!(path = %path.display(), "Exported meeting summary");
    Ok(path)
}

fn export_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(dirs::document_dir)
}

/// File name for an exported summary, derived from the room id.
pub(crate) fn summary_filename(meeting_id: &str) -> String {
    let safe: String = meeting_id
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("MeetingSummary_{}.pdf", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_filename_uses_meeting_id() {
        assert_eq!(summary_filename("42"), "MeetingSummary_42.pdf");
    }

    #[test]
    fn test_summary_filename_replaces_path_separators() {
        assert_eq!(summary_filename("a/b\\c"), "MeetingSummary_a-b-c.pdf");
    }
}
