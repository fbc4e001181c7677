//! Selection capture for assistant context.
//!
//! The capture hotkey reads the current selection from the clipboard
//! and resolves it against the live transcript. Only text that actually
//! appears in a transcript record becomes context; anything else is
//! ignored so stray clipboard content never leaks into prompts.

use arboard::Clipboard;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::records::Transcript;

/// A captured piece of transcript used as assistant context.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectionContext {
    /// The selected text
    pub snippet: String,
    /// Index of the transcript record the selection came from
    pub source_index: usize,
}

/// Read the current selection from the clipboard.
///
/// Returns None when the clipboard is empty, unavailable or holds only
/// whitespace.
pub(crate) fn read_selection() -> Option<String> {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            error!("Failed to initialize clipboard: {}", e);
            return None;
        }
    };

    match clipboard.get_text() {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                info!("Clipboard selection is empty, nothing to capture");
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            info!("No text selection available: {}", e);
            None
        }
    }
}

/// Resolve a selection against the transcript.
///
/// The owning record is the first one whose text contains the selected
/// string. Selections that match no record come from outside the
/// transcript and produce no context.
pub(crate) fn resolve_selection(transcript: &Transcript, selection: &str) -> Option<SelectionContext> {
    let selection = selection.trim();
    if selection.is_empty() {
        return None;
    }

    transcript
        .records()
        .iter()
        .position(|record| record.text.contains(selection))
        .map(|source_index| SelectionContext {
            snippet: selection.to_string(),
            source_index,
        })
}

/// Capture the current selection as assistant context.
pub(crate) fn capture_selection(transcript: &Arc<Mutex<Transcript>>) -> Option<SelectionContext> {
    let selection = read_selection()?;

    let guard = match transcript.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let context = resolve_selection(&guard, &selection);
    match &context {
        Some(context) => {
            info!(
                source_index = context.source_index,
                snippet_len = context.snippet.len(),
                "Captured selection as context"
            );
        }
        None => {
            info!("Selection does not match any transcript record, ignoring");
        }
    }
    context
}

/// Copy text to clipboard
pub(crate) fn copy_to_clipboard(text: &str) {
    if !text.trim().is_empty() {
        match Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(text) {
                Ok(_) => {
                    info!("Copied to clipboard ({} chars)", text.len());
                }
                Err(e) => {
                    error!("Failed to copy to clipboard: {}", e);
                }
            },
            Err(e) => {
                error!("Failed to initialize clipboard: {}", e);
            }
        }
    } else {
        info!("Nothing to copy (empty)");
    }
}
