//! OAuth sign-in against the backend.
//!
//! The user is sent to the provider's authorize page in their browser
//! and pastes the authorization code back into the client. The code is
//! exchanged for a token at the backend's callback endpoint.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::session::StoredSession;

/// Request body for the auth callback endpoint.
#[derive(Debug, Serialize)]
struct CallbackRequest<'a> {
    code: &'a str,
}

/// Response from the auth callback endpoint.
#[derive(Debug, Deserialize)]
struct CallbackResponse {
    token: String,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "meetingId")]
    meeting_id: Option<String>,
}

/// Auth errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum AuthError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Auth callback failed ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response from auth callback: {0}")]
    InvalidResponse(String),
}

/// Generate a random state nonce for the authorize request
fn generate_state_nonce() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let mut nonce = [0u8; 16];
    rng.fill(&mut nonce);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Build the authorize URL with a fresh state parameter appended.
pub(crate) fn authorize_url(base: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}state={}", base, separator, generate_state_nonce())
}

/// Open the authorize page in the user's browser.
///
/// Returns false if no browser could be launched, in which case the
/// caller should show the URL for a manual visit.
pub(crate) fn open_authorize_page(url: &str) -> bool {
    match open::that(url) {
        Ok(()) => {
            info!("Opened authorize page in browser");
            true
        }
        Err(e) => {
            warn!("Failed to open browser: {}", e);
            false
        }
    }
}

/// Exchange an authorization code for a stored session.
pub(crate) async fn exchange_code(api_base: &str, code: &str) -> Result<StoredSession, AuthError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let url = format!("{}/v1/auth/callback", api_base.trim_end_matches('/'));
    info!(url = %url, "Exchanging authorization code");

    let response = client
        .post(&url)
        .json(&CallbackRequest { code })
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::ServerError { status, message });
    }

    let callback: CallbackResponse = response.json().await.map_err(|e| {
        AuthError::InvalidResponse(format!("Failed to parse callback response: {}", e))
    })?;

    info!("Authorization code exchanged for session token");
    Ok(StoredSession::new(
        callback.token,
        callback.user_id,
        callback.meeting_id,
    ))
}
