//! Backend REST client.
//!
//! Thin client for the meeting backend's JSON API. Responses are
//! wrapped in a `data` envelope by the server.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::ApiError;

/// Request body for the end-meeting endpoint.
#[derive(Debug, Serialize)]
struct EndMeetingRequest {
    meeting_id: i64,
    user_id: i64,
}

/// Envelope the server wraps every JSON payload in.
#[derive(Debug, Deserialize)]
struct EndMeetingEnvelope {
    data: EndMeetingData,
}

/// Payload of the end-meeting response.
///
/// `texts` is null when the meeting produced no utterances, so it is
/// optional here and normalized to an empty list.
#[derive(Debug, Deserialize)]
struct EndMeetingData {
    #[serde(default)]
    texts: Option<Vec<String>>,
}

/// Client for the meeting backend API.
pub(crate) struct ApiClient {
    base: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new backend client for the given base URL.
    pub(crate) fn new(api_base: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Probe the backend health endpoint.
    pub(crate) async fn health(&self) -> Result<(), ApiError> {
        let url = format!("{}/v1/health", self.base);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ServerError { status, message });
        }

        Ok(())
    }

    /// End the meeting and fetch the full transcript for summarization.
    ///
    /// Returns the utterance texts in recording order.
    #[instrument(skip(self))]
    pub(crate) async fn end_meeting(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/v1/ping/end-meeting", self.base);
        let request = EndMeetingRequest {
            meeting_id,
            user_id,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ServerError { status, message });
        }

        let envelope: EndMeetingEnvelope = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse end-meeting response: {}", e))
        })?;

        let texts = envelope.data.texts.unwrap_or_default();
        info!(utterances = texts.len(), "Meeting ended, transcript fetched");
        Ok(texts)
    }
}
