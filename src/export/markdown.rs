//! Simple markdown parsing for summary rendering.
//!
//! Summaries come back from Gemini as markdown with headings, bullet
//! points, emphasis, blockquotes and fenced code blocks. The parser
//! breaks the text into flat segments that both the terminal view and
//! the PDF writer can style.

/// Markdown segment types produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MarkdownSegment {
    Header1(String),     // # header
    Header2(String),     // ## header
    Header3(String),     // ### header
    BulletPoint(String), // - item or * item
    BlockQuote(String),  // > quoted line
    CodeLine(String),    // line inside a fenced code block
    Bold(String),        // **text**
    Italic(String),      // *text*
    Normal(String),      // regular text
}

/// Parse text into flat markdown segments, one line at a time.
pub(crate) fn parse_markdown(text: &str) -> Vec<MarkdownSegment> {
    let mut segments = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            segments.push(MarkdownSegment::CodeLine(line.to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
            continue;
        }

        if let Some(content) = trimmed.strip_prefix("### ") {
            segments.push(MarkdownSegment::Header3(content.to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else if let Some(content) = trimmed.strip_prefix("## ") {
            segments.push(MarkdownSegment::Header2(content.to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else if let Some(content) = trimmed.strip_prefix("# ") {
            segments.push(MarkdownSegment::Header1(content.to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else if let Some(content) = trimmed.strip_prefix('>') {
            segments.push(MarkdownSegment::BlockQuote(content.trim_start().to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else if let Some(content) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            segments.push(MarkdownSegment::BulletPoint(content.to_string()));
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else if !line.is_empty() {
            parse_inline_formatting(line, &mut segments);
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        } else {
            segments.push(MarkdownSegment::Normal("\n".to_string()));
        }
    }

    segments
}

/// Scan a line for bold runs, handing the spans between them to the
/// italic pass.
fn parse_inline_formatting(text: &str, segments: &mut Vec<MarkdownSegment>) {
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(start) = remaining.find("**") else {
            parse_italic_formatting(remaining, segments);
            break;
        };

        let after_start = &remaining[start + 2..];
        let Some(end) = after_start.find("**") else {
            // Unclosed marker, the rest of the line is literal text
            segments.push(MarkdownSegment::Normal(remaining.to_string()));
            break;
        };

        if start > 0 {
            parse_italic_formatting(&remaining[..start], segments);
        }
        segments.push(MarkdownSegment::Bold(after_start[..end].to_string()));
        remaining = &after_start[end + 2..];
    }
}

/// Parse inline italic formatting within a span that holds no bold markers
fn parse_italic_formatting(text: &str, segments: &mut Vec<MarkdownSegment>) {
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(start) = remaining.find('*') else {
            segments.push(MarkdownSegment::Normal(remaining.to_string()));
            break;
        };

        let after_start = &remaining[start + 1..];
        match after_start.find('*') {
            Some(end) => {
                if start > 0 {
                    segments.push(MarkdownSegment::Normal(remaining[..start].to_string()));
                }
                segments.push(MarkdownSegment::Italic(after_start[..end].to_string()));
                remaining = &after_start[end + 1..];
            }
            None => {
                segments.push(MarkdownSegment::Normal(remaining.to_string()));
                break;
            }
        }
    }
}

/// Strip a fenced-code wrapper from a markdown response.
///
/// Gemini sometimes wraps the whole summary in a single fenced block,
/// optionally tagged with a language. The wrapper is removed only when
/// both the opening and closing fences are present; fences that belong
/// to code blocks inside the summary are left alone.
pub(crate) fn strip_code_fence(markdown: &str) -> String {
    let trimmed = markdown.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return markdown.to_string();
    };
    let Some(newline) = rest.find('\n') else {
        return markdown.to_string();
    };
    let tag = rest[..newline].trim();
    if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return markdown.to_string();
    }

    let body = &rest[newline + 1..];
    let Some(inner) = body.trim_end().strip_suffix("```") else {
        return markdown.to_string();
    };

    inner.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let segments = parse_markdown("# Top\n## Section\n### Sub");
        assert!(matches!(&segments[0], MarkdownSegment::Header1(s) if s == "Top"));
        assert!(matches!(&segments[2], MarkdownSegment::Header2(s) if s == "Section"));
        assert!(matches!(&segments[4], MarkdownSegment::Header3(s) if s == "Sub"));
    }

    #[test]
    fn test_parse_bullets() {
        let segments = parse_markdown("- first\n* second");
        assert!(matches!(&segments[0], MarkdownSegment::BulletPoint(s) if s == "first"));
        assert!(matches!(&segments[2], MarkdownSegment::BulletPoint(s) if s == "second"));
    }

    #[test]
    fn test_parse_blockquote() {
        let segments = parse_markdown("> important note");
        assert!(matches!(&segments[0], MarkdownSegment::BlockQuote(s) if s == "important note"));
    }

    #[test]
    fn test_parse_inline_bold() {
        let segments = parse_markdown("before **middle** after");
        assert!(matches!(&segments[0], MarkdownSegment::Normal(s) if s == "before "));
        assert!(matches!(&segments[1], MarkdownSegment::Bold(s) if s == "middle"));
        assert!(matches!(&segments[2], MarkdownSegment::Normal(s) if s == " after"));
    }

    #[test]
    fn test_parse_inline_italic() {
        let segments = parse_markdown("an *italic* word");
        assert!(matches!(&segments[0], MarkdownSegment::Normal(s) if s == "an "));
        assert!(matches!(&segments[1], MarkdownSegment::Italic(s) if s == "italic"));
        assert!(matches!(&segments[2], MarkdownSegment::Normal(s) if s == " word"));
    }

    #[test]
    fn test_parse_unclosed_bold_is_normal() {
        let segments = parse_markdown("no **bold here");
        assert!(matches!(&segments[0], MarkdownSegment::Normal(s) if s == "no **bold here"));
    }

    #[test]
    fn test_parse_fenced_code_block() {
        let segments = parse_markdown("before\n```rust\nlet x = 1;\n```\nafter");

        assert!(matches!(&segments[0], MarkdownSegment::Normal(s) if s == "before"));
        assert!(segments
            .iter()
            .any(|s| matches!(s, MarkdownSegment::CodeLine(l) if l == "let x = 1;")));
        assert!(segments
            .iter()
            .any(|s| matches!(s, MarkdownSegment::Normal(l) if l == "after")));
        // Fence lines themselves are dropped
        assert!(!segments
            .iter()
            .any(|s| matches!(s, MarkdownSegment::Normal(l) if l.contains("```"))));
    }

    #[test]
    fn test_strip_code_fence_removes_wrapper() {
        let wrapped = "```markdown\n# Summary\n- item\n```";
        let stripped = strip_code_fence(wrapped);
        assert_eq!(stripped, "# Summary\n- item");
        assert!(!stripped.contains("```"));
    }

    #[test]
    fn test_strip_code_fence_untagged_wrapper() {
        let wrapped = "```\n# Summary\n```";
        assert_eq!(strip_code_fence(wrapped), "# Summary");
    }

    #[test]
    fn test_strip_code_fence_passes_plain_markdown_through() {
        let plain = "# Summary\n- item";
        assert_eq!(strip_code_fence(plain), plain);
    }

    #[test]
    fn test_strip_code_fence_requires_both_fences() {
        let only_leading = "```markdown\n# Summary";
        assert_eq!(strip_code_fence(only_leading), only_leading);
    }

    #[test]
    fn test_strip_code_fence_keeps_inner_code_blocks() {
        let content = "# Summary\n```rust\nlet x = 1;\n```";
        assert_eq!(strip_code_fence(content), content);
    }
}
