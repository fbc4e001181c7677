//! PDF generation from markdown content.
//!
//! Uses genpdf to render markdown-formatted meeting summaries to PDF
//! files with proper styling (headers, bold, bullet points, quotes).

use std::path::Path;

use anyhow::{Context, Result};
use genpdf::elements::{Break, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, Margins, SimplePageDecorator};
use tracing::{debug, info};

use crate::export::markdown::{parse_markdown, MarkdownSegment};

/// Font sizes for PDF output (in points).
const NORMAL_SIZE: u8 = 11;
const BOLD_SIZE: u8 = 11;
const H1_SIZE: u8 = 18;
const H2_SIZE: u8 = 14;
const H3_SIZE: u8 = 12;
const CODE_SIZE: u8 = 10;
const TITLE_SIZE: u8 = 22;

/// Page margins in mm.
const MARGIN_MM: f64 = 20.0;

/// Indentation prefix for blockquotes and code lines.
const INDENT: &str = "    ";

/// System font directories tried in order, each listing the regular,
/// bold, italic and bold-italic files of a single family.
const FONT_CANDIDATES: &[(&str, [&str; 4])] = &[
    (
        "/usr/share/fonts/truetype/dejavu",
        [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
    ),
    (
        "/usr/share/fonts/truetype/liberation",
        [
            "LiberationSans-Regular.ttf",
            "LiberationSans-Bold.ttf",
            "LiberationSans-Italic.ttf",
            "LiberationSans-BoldItalic.ttf",
        ],
    ),
    (
        "/usr/share/fonts/TTF",
        [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
    ),
    (
        "/System/Library/Fonts/Supplemental",
        [
            "Arial.ttf",
            "Arial Bold.ttf",
            "Arial Italic.ttf",
            "Arial Bold Italic.ttf",
        ],
    ),
    (
        "C:\\Windows\\Fonts",
        ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"],
    ),
];

/// Write a markdown-formatted meeting summary to a PDF file.
///
/// Renders a title block first and then the parsed markdown. Headers
/// get their own sizes, emphasis is preserved, and bullet points,
/// blockquotes and code lines are indented.
///
/// # Errors
///
/// Returns an error if no usable font family is found on the system or
/// the file cannot be written.
pub(crate) fn write_summary_pdf(path: &Path, meeting_id: &str, content: &str) -> Result<()> {
    info!(
        path = %path.display(),
        content_length = content.len(),
        "Generating meeting summary PDF"
    );

    let font_family =
        load_font_family().with_context(|| "Failed to load system font for PDF generation")?;

    let mut doc = Document::new(font_family);
    doc.set_title(format!("AudioUS Meeting Summary {}", meeting_id));

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(MARGIN_MM, MARGIN_MM, MARGIN_MM, MARGIN_MM));
    doc.set_page_decorator(decorator);

    push_title_block(&mut doc, meeting_id);

    for segment in parse_markdown(content) {
        match segment {
            MarkdownSegment::Header1(text) => {
                let style = Style::new().bold().with_font_size(H1_SIZE);
                doc.push(Paragraph::new(StyledString::new(text, style)));
            }
            MarkdownSegment::Header2(text) => {
                let style = Style::new().bold().with_font_size(H2_SIZE);
                doc.push(Paragraph::new(StyledString::new(text, style)));
            }
            MarkdownSegment::Header3(text) => {
                let style = Style::new().bold().with_font_size(H3_SIZE);
                doc.push(Paragraph::new(StyledString::new(text, style)));
            }
            MarkdownSegment::BulletPoint(text) => {
                let bullet_text = format!("  \u{2022}  {}", text);
                let style = Style::new().with_font_size(NORMAL_SIZE);
                doc.push(Paragraph::new(StyledString::new(bullet_text, style)));
            }
            MarkdownSegment::BlockQuote(text) => {
                let quoted = format!("{}{}", INDENT, text);
                let style = Style::new().italic().with_font_size(NORMAL_SIZE);
                doc.push(Paragraph::new(StyledString::new(quoted, style)));
            }
            MarkdownSegment::CodeLine(text) => {
                let code = format!("{}{}", INDENT, text);
                let style = Style::new().with_font_size(CODE_SIZE);
                doc.push(Paragraph::new(StyledString::new(code, style)));
            }
            MarkdownSegment::Bold(text) => {
                let style = Style::new().bold().with_font_size(BOLD_SIZE);
                doc.push(Paragraph::new(StyledString::new(text, style)));
            }
            MarkdownSegment::Italic(text) => {
                let style = Style::new().italic().with_font_size(NORMAL_SIZE);
                doc.push(Paragraph::new(StyledString::new(text, style)));
            }
            MarkdownSegment::Normal(text) => {
                if text == "\n" {
                    doc.push(Break::new(0.5));
                } else {
                    let style = Style::new().with_font_size(NORMAL_SIZE);
                    doc.push(Paragraph::new(StyledString::new(text, style)));
                }
            }
        }
    }

    doc.render_to_file(path)
        .with_context(|| format!("Failed to render PDF to {}", path.display()))?;

    info!(path = %path.display(), "Meeting summary PDF saved successfully");
    Ok(())
}

/// Title block rendered above the summary content.
fn push_title_block(doc: &mut Document, meeting_id: &str) {
    doc.push(Paragraph::new(StyledString::new(
        "AudioUS",
        Style::new().bold().with_font_size(TITLE_SIZE),
    )));
    doc.push(Paragraph::new(StyledString::new(
        format!("Meeting Summary for room {}", meeting_id),
        Style::new().with_font_size(H3_SIZE),
    )));
    doc.push(Paragraph::new(StyledString::new(
        chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        Style::new().with_font_size(NORMAL_SIZE),
    )));
    doc.push(Break::new(1.0));
}

/// Load a font family for PDF generation.
///
/// Tries known system font locations in order and uses the first
/// family whose four files all load.
fn load_font_family() -> Result<FontFamily<FontData>> {
    for (dir, files) in FONT_CANDIDATES {
        let font_dir = Path::new(dir);
        if !font_dir.is_dir() {
            continue;
        }
        match load_family_from(font_dir, files) {
            Ok(family) => {
                debug!(dir = %font_dir.display(), "Loaded PDF font family");
                return Ok(family);
            }
            Err(error) => {
                debug!(dir = %font_dir.display(), %error, "Skipping font candidate");
            }
        }
    }

    anyhow::bail!("No usable font family found in known system font directories")
}

fn load_family_from(dir: &Path, files: &[&str; 4]) -> Result<FontFamily<FontData>> {
    Ok(FontFamily {
        regular: load_font(dir, files[0])?,
        bold: load_font(dir, files[1])?,
        italic: load_font(dir, files[2])?,
        bold_italic: load_font(dir, files[3])?,
    })
}

fn load_font(dir: &Path, file: &str) -> Result<FontData> {
    let path = dir.join(file);
    FontData::new(
        std::fs::read(&path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?,
        None,
    )
    .with_context(|| format!("Failed to parse font: {}", path.display()))
}
