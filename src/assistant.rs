//! AI assistant panel.
//!
//! Holds the per-meeting conversation with Gemini. Each question is
//! sent together with the captured context, if any, and the reply is
//! appended to the conversation. Failures are appended as visible
//! conversation entries and also returned to the caller.

use tokio::time::{timeout, Duration};
use tracing::{error, info};

use crate::error::GeminiError;
use crate::gemini::GeminiClient;

/// Display name for the assistant.
pub(crate) const ASSISTANT_NAME: &str = "Gemini";

/// Shown while a Gemini request is in flight.
pub(crate) const THINKING_TEXT: &str = "Gemini is thinking...";

/// Shown when Gemini answered without any usable text.
pub(crate) const NO_RESPONSE_FALLBACK: &str = "No response from Gemini.";

/// Timeout for assistant requests.
const ASSISTANT_TIMEOUT: Duration = Duration::from_secs(60);

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Speaker {
    Participant,
    Assistant,
}

/// One entry in the assistant conversation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AssistantMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// Conversation state for one joined meeting.
///
/// Discarded when the meeting is left, so every join starts with an
/// empty conversation.
#[derive(Debug, Default)]
pub(crate) struct AssistantPanel {
    messages: Vec<AssistantMessage>,
    waiting: bool,
}

/// Pick the reply text, falling back when Gemini gave nothing usable.
fn reply_text(answer: Option<String>) -> String {
    answer
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string())
}

impl AssistantPanel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn messages(&self) -> &[AssistantMessage] {
        &self.messages
    }

    pub(crate) fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Send a question to the assistant and append the outcome.
    ///
    /// Blank input and input sent while a request is already in flight
    /// are ignored. On failure the error is recorded in the
    /// conversation and returned.
    pub(crate) async fn send(
        &mut self,
        input: &str,
        context: Option<&str>,
        gemini: &GeminiClient,
    ) -> Result<(), GeminiError> {
        let input = input.trim();
        if input.is_empty() || self.waiting {
            return Ok(());
        }

        self.messages.push(AssistantMessage {
            speaker: Speaker::Participant,
            text: input.to_string(),
        });
        self.waiting = true;

        let result = timeout(ASSISTANT_TIMEOUT, gemini.generate(context, input)).await;

        match result {
            Ok(Ok(answer)) => {
                let text = reply_text(answer);
                info!(reply_len = text.len(), "Assistant replied");
                self.messages.push(AssistantMessage {
                    speaker: Speaker::Assistant,
                    text,
                });
                self.waiting = false;
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Assistant request failed: {}", e);
                self.record_failure(&e);
                Err(e)
            }
            Err(_) => {
                error!("Assistant request timed out after {:?}", ASSISTANT_TIMEOUT);
                let e = GeminiError::Timeout;
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Append a failure entry so the error is visible in the panel.
    fn record_failure(&mut self, error: &GeminiError) {
        self.messages.push(AssistantMessage {
            speaker: Speaker::Assistant,
            text: format!("The assistant request failed: {}", error),
        });
        self.waiting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    fn test_client() -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            model: "gemini-2.0-flash".to_string(),
            api_key: Some("test-key".to_string()),
        })
        .expect("Failed to build client")
    }

    #[test]
    fn test_reply_text_uses_answer() {
        assert_eq!(reply_text(Some("An answer".to_string())), "An answer");
    }

    #[test]
    fn test_reply_text_fallback_on_none() {
        assert_eq!(reply_text(None), NO_RESPONSE_FALLBACK);
    }

    #[test]
    fn test_reply_text_fallback_on_blank() {
        assert_eq!(reply_text(Some("   ".to_string())), NO_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut panel = AssistantPanel::new();
        let client = test_client();

        panel.send("   ", None, &client).await.expect("Blank input should be a no-op");

        assert!(panel.messages().is_empty());
        assert!(!panel.is_waiting());
    }

    #[tokio::test]
    async fn test_input_while_waiting_is_ignored() {
        let mut panel = AssistantPanel::new();
        panel.waiting = true;
        let client = test_client();

        panel.send("question", None, &client).await.expect("Should be a no-op");

        assert!(panel.messages().is_empty());
    }

    #[test]
    fn test_record_failure_appends_visible_entry() {
        let mut panel = AssistantPanel::new();
        panel.waiting = true;

        panel.record_failure(&GeminiError::MissingApiKey);

        assert!(!panel.is_waiting());
        assert_eq!(panel.messages().len(), 1);
        let entry = &panel.messages()[0];
        assert_eq!(entry.speaker, Speaker::Assistant);
        assert!(entry.text.contains("failed"));
        assert!(entry.text.contains("GEMINI_API_KEY"));
    }
}
