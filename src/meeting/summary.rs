//! Summary prompt and placeholder synthesis.
//!
//! When a meeting ends the transcript view is rebuilt as a short
//! exchange: the user's summary request, a thinking placeholder, and
//! finally the generated summary in the assistant's place.

use crate::assistant::{ASSISTANT_NAME, THINKING_TEXT};
use crate::records::ChatRecord;

/// Text of the synthesized summary request shown in the transcript.
pub(crate) const SUMMARY_REQUEST_TEXT: &str =
    "Please summarize this meeting and provide key points and action items.";

/// Shown when Gemini produced no usable summary text.
pub(crate) const NO_SUMMARY_FALLBACK: &str = "No summary available.";

/// Prompt template for summary generation.
/// Use `{transcript}` placeholder for the joined utterance texts.
const SUMMARY_PROMPT_TEMPLATE: &str = r#"
You are an AI assistant. Please summarize the following meeting transcript.
- Present the summary in markdown format, using headings, bullet points, bold, italics, blockquotes, and code blocks where appropriate.
- Divide the summary into clear sections: General Summary, Key Points, Action Items, and Important Notes (if any).
- Ensure the markdown is well-structured and visually appealing.

Meeting transcript:
{transcript}
"#;

/// Build the summary prompt from the fetched utterance texts.
///
/// Texts are joined with single newlines in recording order.
pub(crate) fn build_summary_prompt(texts: &[String]) -> String {
    SUMMARY_PROMPT_TEMPLATE.replace("{transcript}", &texts.join("\n"))
}

/// Pick the summary text, falling back when Gemini gave nothing usable.
pub(crate) fn summary_or_fallback(answer: Option<String>) -> String {
    answer
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| NO_SUMMARY_FALLBACK.to_string())
}

/// Synthesize the placeholder records shown while the summary is
/// generated: the user's request followed by the thinking indicator.
pub(crate) fn placeholder_records(user_id: &str) -> Vec<ChatRecord> {
    vec![
        ChatRecord::local(user_id, "You", SUMMARY_REQUEST_TEXT),
        ChatRecord::local(ASSISTANT_NAME, ASSISTANT_NAME, THINKING_TEXT),
    ]
}

/// Build the transcript record carrying the finished summary.
pub(crate) fn summary_record(summary: &str) -> ChatRecord {
    ChatRecord::local(ASSISTANT_NAME, ASSISTANT_NAME, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_joins_texts_with_newline() {
        let texts = vec!["hello".to_string(), "world".to_string()];
        let prompt = build_summary_prompt(&texts);
        assert!(prompt.contains("hello\nworld"));
    }

    #[test]
    fn test_prompt_keeps_section_instructions() {
        let prompt = build_summary_prompt(&["a".to_string()]);
        assert!(prompt.contains("General Summary"));
        assert!(prompt.contains("Key Points"));
        assert!(prompt.contains("Action Items"));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn test_prompt_with_empty_transcript() {
        let prompt = build_summary_prompt(&[]);
        assert!(prompt.contains("Meeting transcript:"));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn test_summary_fallback_on_none() {
        assert_eq!(summary_or_fallback(None), NO_SUMMARY_FALLBACK);
    }

    #[test]
    fn test_summary_fallback_on_blank() {
        assert_eq!(summary_or_fallback(Some("  \n".to_string())), NO_SUMMARY_FALLBACK);
    }

    #[test]
    fn test_summary_uses_answer() {
        assert_eq!(
            summary_or_fallback(Some("## Summary".to_string())),
            "## Summary"
        );
    }

    #[test]
    fn test_placeholder_records_shape() {
        let placeholders = placeholder_records("7");
        assert_eq!(placeholders.len(), 2);

        assert_eq!(placeholders[0].user_id, "7");
        assert_eq!(placeholders[0].user_name, "You");
        assert_eq!(placeholders[0].text, SUMMARY_REQUEST_TEXT);

        assert_eq!(placeholders[1].user_id, ASSISTANT_NAME);
        assert_eq!(placeholders[1].user_name, ASSISTANT_NAME);
        assert_eq!(placeholders[1].text, THINKING_TEXT);
    }

    #[test]
    fn test_summary_record_is_authored_by_assistant() {
        let record = summary_record("## Notes");
        assert_eq!(record.user_id, ASSISTANT_NAME);
        assert_eq!(record.text, "## Notes");
    }
}
