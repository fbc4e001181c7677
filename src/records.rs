//! Transcript records and the in-memory transcript.
//!
//! The backend broadcasts finalized utterances as JSON frames with
//! PascalCase keys. Frames are parsed into `ChatRecord` values and
//! appended to the session `Transcript` in delivery order.

use serde::{Deserialize, Deserializer};

/// A single finalized utterance from the meeting feed.
///
/// Mirrors the backend record shape. `UserID` arrives as a JSON number
/// from the backend but as a string in locally synthesized records, so
/// it is coerced to a string on the way in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ChatRecord {
    #[serde(rename = "UserID", deserialize_with = "string_or_number")]
    pub user_id: String,

    #[serde(rename = "UserName")]
    pub user_name: String,

    #[serde(rename = "Text")]
    pub text: String,

    #[serde(rename = "RecordedAt")]
    pub recorded_at: String,
}

impl ChatRecord {
    /// Create a record synthesized on the client (not received from the feed).
    pub(crate) fn local(user_id: &str, user_name: &str, text: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            text: text.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether this record was authored by the given user.
    ///
    /// Both sides are compared as trimmed strings so that numeric ids
    /// from the backend match the id the user typed at the join form.
    pub(crate) fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id.trim() == user_id.trim()
    }
}

/// Accept either a JSON string or a JSON number for an id field.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

/// Ordered collection of transcript records for one joined meeting.
///
/// Records are append-only while the feed is live. The whole transcript
/// is cleared when the user disconnects and replaced wholesale with the
/// synthesized summary exchange.
#[derive(Debug, Default)]
pub(crate) struct Transcript {
    records: Vec<ChatRecord>,
}

impl Transcript {
    pub(crate) fn push(&mut self, record: ChatRecord) {
        self.records.push(record);
    }

    pub(crate) fn records(&self) -> &[ChatRecord] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Replace all records at once, e.g. with the summary placeholders.
    pub(crate) fn reset_with(&mut self, records: Vec<ChatRecord>) {
        self.records = records;
    }

    /// Replace the most recent record, used to swap the thinking
    /// placeholder for the finished summary.
    pub(crate) fn replace_last(&mut self, record: ChatRecord) {
        if let Some(last) = self.records.last_mut() {
            *last = record;
        } else {
            self.records.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialization_numeric_user_id() {
        let json = r#"{
            "ID": 7,
            "UserID": 12345,
            "UserName": "Alice",
            "MeetingID": "42",
            "Text": "hello there",
            "RecordedAt": "2024-01-01T00:00:00Z",
            "EndRecordedAt": "2024-01-01T00:00:03Z"
        }"#;

        let record: ChatRecord = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(record.user_id, "12345");
        assert_eq!(record.user_name, "Alice");
        assert_eq!(record.text, "hello there");
        assert_eq!(record.recorded_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_record_deserialization_string_user_id() {
        let json = r#"{
            "UserID": "U1",
            "UserName": "Alice",
            "Text": "hi",
            "RecordedAt": "2024-01-01T00:00:00Z"
        }"#;

        let record: ChatRecord = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(record.user_id, "U1");
    }

    #[test]
    fn test_record_deserialization_missing_field_fails() {
        let json = r#"{"UserID": "U1", "UserName": "Alice"}"#;
        assert!(serde_json::from_str::<ChatRecord>(json).is_err());
    }

    #[test]
    fn test_is_authored_by_trims_both_sides() {
        let record = ChatRecord::local(" 42 ", "Alice", "hi");
        assert!(record.is_authored_by("42"));
        assert!(record.is_authored_by("  42"));
        assert!(!record.is_authored_by("43"));
    }

    #[test]
    fn test_transcript_preserves_delivery_order() {
        let mut transcript = Transcript::default();
        transcript.push(ChatRecord::local("1", "Alice", "first"));
        transcript.push(ChatRecord::local("2", "Bob", "second"));
        transcript.push(ChatRecord::local("1", "Alice", "third"));

        let texts: Vec<&str> = transcript.records().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_transcript_replace_last() {
        let mut transcript = Transcript::default();
        transcript.push(ChatRecord::local("1", "Alice", "keep"));
        transcript.push(ChatRecord::local("Gemini", "Gemini", "thinking"));

        transcript.replace_last(ChatRecord::local("Gemini", "Gemini", "the summary"));

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.records()[0].text, "keep");
        assert_eq!(transcript.records()[1].text, "the summary");
    }

    #[test]
    fn test_transcript_reset_with() {
        let mut transcript = Transcript::default();
        transcript.push(ChatRecord::local("1", "Alice", "old"));

        transcript.reset_with(vec![
            ChatRecord::local("2", "You", "a"),
            ChatRecord::local("Gemini", "Gemini", "b"),
        ]);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.records()[0].text, "a");
    }
}
