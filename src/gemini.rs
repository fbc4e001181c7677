//! Gemini client for summaries and assistant replies.
//!
//! Calls the Google Generative Language API directly with the user's
//! own API key. Both the meeting summary and the assistant panel go
//! through the same generateContent endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use zeroize::Zeroize;

use crate::config::GeminiConfig;
use crate::error::GeminiError;

/// Generative Language API base URL
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini generateContent API.
pub(crate) struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for generateContent.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

/// Content block in the request.
#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

/// Text part in the request.
#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

/// Response from generateContent.
///
/// Every level is optional: an empty object is a valid response that
/// simply carries no usable text.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Combine an optional context block with the user message.
///
/// A blank context is treated as absent so captured-selection state
/// that was cleared does not leave a dangling separator in the prompt.
fn compose_prompt(context: Option<&str>, message: &str) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("{}\n\n{}", context, message),
        None => message.to_string(),
    }
}

impl GeminiClient {
    /// Create a new Gemini client from configuration.
    ///
    /// Fails when no API key is configured so callers surface the
    /// problem instead of sending unauthenticated requests.
    pub(crate) fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            client,
        })
    }

    /// Ask Gemini for a reply to `message`, optionally prefixed with a
    /// context block.
    ///
    /// Returns Ok(None) when the response carried no usable text, so
    /// call sites can substitute their own fallback wording.
    #[instrument(skip(self, context, message), fields(message_len = message.len()))]
    pub(crate) async fn generate(
        &self,
        context: Option<&str>,
        message: &str,
    ) -> Result<Option<String>, GeminiError> {
        let prompt = compose_prompt(context, message);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::ServerError { status, message });
        }

        let generate_response: GenerateResponse = response.json().await.map_err(|e| {
            GeminiError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = Self::extract_text(&generate_response);
        info!(
            model = %self.model,
            has_text = text.is_some(),
            "Gemini generateContent completed"
        );
        Ok(text)
    }

    /// Extract the first candidate's first text part, if any.
    fn extract_text(response: &GenerateResponse) -> Option<String> {
        response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .clone()
            .filter(|text| !text.is_empty())
    }
}

impl Drop for GeminiClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: "Summarize this".to_string(),
                }],
            }],
        };

        let json = serde_json::to_string(&request).expect("Failed to serialize");
        assert_eq!(json, r#"{"contents":[{"parts":[{"text":"Summarize this"}]}]}"#);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "Here is the summary."}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateResponse = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(
            GeminiClient::extract_text(&response),
            Some("Here is the summary.".to_string())
        );
    }

    #[test]
    fn test_empty_object_response_yields_no_text() {
        let response: GenerateResponse = serde_json::from_str("{}").expect("Failed to deserialize");
        assert_eq!(GeminiClient::extract_text(&response), None);
    }

    #[test]
    fn test_empty_candidates_yield_no_text() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates": []}"#).expect("Failed to deserialize");
        assert_eq!(GeminiClient::extract_text(&response), None);
    }

    #[test]
    fn test_empty_text_part_yields_no_text() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": ""}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(GeminiClient::extract_text(&response), None);
    }

    #[test]
    fn test_compose_prompt_with_context() {
        let prompt = compose_prompt(Some("captured text"), "what was said?");
        assert_eq!(prompt, "captured text\n\nwhat was said?");
    }

    #[test]
    fn test_compose_prompt_without_context() {
        assert_eq!(compose_prompt(None, "hello"), "hello");
    }

    #[test]
    fn test_compose_prompt_blank_context_ignored() {
        assert_eq!(compose_prompt(Some("   "), "hello"), "hello");
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = GeminiConfig {
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(GeminiError::MissingApiKey)
        ));
    }
}
