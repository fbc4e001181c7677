//! Terminal rendering of transcript records.
//!
//! Each record renders as `[HH:MM:SS] Name: text`. Records authored by
//! the current user are right-aligned against the display width, other
//! participants render left-aligned. A captured record carries a
//! leading marker.

use colored::Colorize;

use crate::records::ChatRecord;

/// Marker prefixed to the record whose text was captured as context.
const CAPTURE_MARKER: &str = "\u{00bb} ";

/// Render one transcript record as a single terminal line.
///
/// Alignment padding is computed on the plain text before any styling
/// is applied, so escape sequences never shift the layout.
pub(crate) fn render_record(
    record: &ChatRecord,
    current_user: &str,
    highlighted: bool,
    width: usize,
) -> String {
    let time = timestamp_label(&record.recorded_at);
    let head = format!("[{}] {}:", time, record.user_name);
    let marker = if highlighted { CAPTURE_MARKER } else { "" };

    let plain_len =
        marker.chars().count() + head.chars().count() + 1 + record.text.chars().count();

    let own = record.is_authored_by(current_user);
    let pad = if own {
        " ".repeat(width.saturating_sub(plain_len))
    } else {
        String::new()
    };

    let head = if own {
        head.green().bold()
    } else {
        head.cyan().bold()
    };
    let marker = if highlighted {
        marker.yellow().bold().to_string()
    } else {
        String::new()
    };

    format!("{}{}{} {}", pad, marker, head, record.text)
}

/// Local wall-clock time of a record, falling back to the raw value
/// when the timestamp does not parse.
fn timestamp_label(recorded_at: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(recorded_at) {
        Ok(ts) => ts
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string(),
        Err(_) => recorded_at.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_colors() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_own_record_is_right_aligned() {
        plain_colors();
        let record: ChatRecord = serde_json::from_str(
            r#"{"UserID":"U1","UserName":"Alice","Text":"hi","RecordedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let rendered = render_record(&record, "U1", false, 60);

        assert!(rendered.starts_with("  "));
        assert_eq!(rendered.chars().count(), 60);
        assert!(rendered.contains("Alice:"));
        assert!(rendered.ends_with("hi"));
    }

    #[test]
    fn test_other_record_is_left_aligned() {
        plain_colors();
        let record: ChatRecord = serde_json::from_str(
            r#"{"UserID":7,"UserName":"Bob","Text":"hello","RecordedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let rendered = render_record(&record, "U1", false, 60);

        assert!(rendered.starts_with('['));
        assert!(rendered.contains("Bob:"));
        assert!(rendered.ends_with("hello"));
    }

    #[test]
    fn test_highlighted_record_carries_marker() {
        plain_colors();
        let record = ChatRecord::local("U2", "Bob", "the quarterly numbers");

        let rendered = render_record(&record, "U1", true, 80);

        assert!(rendered.contains('\u{00bb}'));
    }

    #[test]
    fn test_unparseable_timestamp_renders_raw() {
        plain_colors();
        let record = ChatRecord {
            user_id: "U2".to_string(),
            user_name: "Bob".to_string(),
            text: "hi".to_string(),
            recorded_at: "yesterday".to_string(),
        };

        let rendered = render_record(&record, "U1", false, 80);

        assert!(rendered.starts_with("[yesterday]"));
    }

    #[test]
    fn test_width_smaller_than_text_does_not_panic() {
        plain_colors();
        let record = ChatRecord::local("U1", "Alice", "a fairly long message body");

        let rendered = render_record(&record, "U1", false, 10);

        assert!(rendered.contains("Alice:"));
    }
}
