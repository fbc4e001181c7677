//! Stored sign-in session
//!
//! Persists the OAuth token to a JSON file in the user's config
//! directory so a restart within the validity window skips the sign-in
//! flow. Sessions expire seven days after they are created, matching
//! the server-side token lifetime.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use zeroize::Zeroize;

/// Session lifetime in days.
const SESSION_TTL_DAYS: i64 = 7;

/// A persisted sign-in session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub token: String,
    /// User id returned by the auth callback, if the server provided one
    pub user_id: Option<String>,
    /// Meeting id to rejoin, if the server provided one
    pub meeting_id: Option<String>,
    /// Expiry timestamp (RFC 3339)
    pub expires_at: String,
}

impl StoredSession {
    /// Create a session expiring `SESSION_TTL_DAYS` from now.
    pub(crate) fn new(token: String, user_id: Option<String>, meeting_id: Option<String>) -> Self {
        let expires_at = (chrono::Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).to_rfc3339();
        Self {
            token,
            user_id,
            meeting_id,
            expires_at,
        }
    }

    /// Whether the session has passed its expiry timestamp.
    ///
    /// An unparseable timestamp counts as expired so a corrupt file
    /// falls back to a fresh sign-in.
    pub(crate) fn is_expired(&self) -> bool {
        match chrono::DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => chrono::Utc::now() >= expires_at,
            Err(_) => {
                warn!("Failed to parse session expiry timestamp, treating as expired");
                true
            }
        }
    }
}

impl Drop for StoredSession {
    fn drop(&mut self) {
        // Clear token from memory
        self.token.zeroize();
    }
}

/// Get the session file path
fn session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("AudioUS").join("session.json"))
}

/// Load the stored session from disk.
///
/// Returns None if the file is missing, unreadable, corrupt or expired.
pub(crate) fn load_session() -> Option<StoredSession> {
    let path = session_path()?;

    if !path.exists() {
        return None;
    }

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            error!("Failed to read session file: {}", e);
            return None;
        }
    };

    let session: StoredSession = match serde_json::from_str(&contents) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to parse session file: {}", e);
            return None;
        }
    };

    if session.is_expired() {
        info!("Stored session has expired, sign-in required");
        return None;
    }

    Some(session)
}

/// Save the session to disk.
pub(crate) fn save_session(session: &StoredSession) -> Result<(), SessionStoreError> {
    let path = session_path().ok_or(SessionStoreError::NoConfigDir)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("Created session directory: {:?}", parent);
        }
    }

    let json = serde_json::to_string_pretty(session)?;
    fs::write(&path, json)?;
    info!("Saved session to: {:?}", path);

    Ok(())
}

/// Session storage errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum SessionStoreError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
