//! Note content reader
//!
//! Derives title, creation time, preview and link tokens from the raw
//! text of a note. The expected layout is a `---` delimited header block
//! carrying a `Created:` field, followed by a body with an optional
//! `# Title` line.

use super::links::{LinkParser, LinkToken};
use crate::graph::NoteId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

/// Default number of body characters kept in a preview
pub const DEFAULT_PREVIEW_LENGTH: usize = 20;

/// Timestamp layouts accepted without an offset; UTC is assumed.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Everything the index needs from a note's content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNote {
    pub title: Option<String>,
    /// `None` when the header has no usable `Created:` field
    pub created: Option<DateTime<Utc>>,
    pub preview: Option<String>,
    pub links: Vec<LinkToken>,
}

/// Reads note content into a [`ParsedNote`]
#[derive(Debug, Clone)]
pub struct NoteAnalyzer {
    parser: LinkParser,
    preview_length: usize,
}

impl Default for NoteAnalyzer {
    fn default() -> Self {
        Self::new(LinkParser::default())
    }
}

impl NoteAnalyzer {
    pub fn new(parser: LinkParser) -> Self {
        Self {
            parser,
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }

    pub fn parser(&self) -> &LinkParser {
        &self.parser
    }

    /// Analyze the content of note `id`.
    ///
    /// Never fails: an unparsable `Created:` value is logged and dropped.
    pub fn analyze(&self, id: &NoteId, content: &str) -> ParsedNote {
        let created = match created_field(content) {
            Some(value) => {
                let parsed = parse_timestamp(value);
                if parsed.is_none() {
                    tracing::warn!(
                        note = %id,
                        value,
                        "unparsable Created header, keeping registration time"
                    );
                }
                parsed
            }
            None => None,
        };

        ParsedNote {
            title: first_title(content),
            created,
            preview: preview(body(content), self.preview_length),
            links: self.parser.parse(content),
        }
    }
}

/// Parse a header timestamp.
///
/// Accepts RFC 3339, offset-less ISO 8601 date-times (taken as UTC) and
/// plain dates (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Value of the first `Created:` line (key matched case-insensitively)
fn created_field(content: &str) -> Option<&str> {
    content.lines().find_map(|line| {
        let (key, value) = line.trim_start().split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("created")
            .then(|| value.trim())
    })
}

/// Source text of the first non-empty level-1 heading.
///
/// Inline markup is kept as written, so `# Graph *Theory*` is titled
/// `Graph *Theory*` and a `[[Graph *Theory*]]` link finds it.
fn first_title(content: &str) -> Option<String> {
    let parser = Parser::new_ext(content, Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    parser.into_offset_iter().find_map(|(event, range)| match event {
        Event::Start(Tag::Heading {
            level: HeadingLevel::H1,
            ..
        }) => {
            let title = heading_text(&content[range]);
            (!title.is_empty()).then(|| title.to_string())
        }
        _ => None,
    })
}

/// Strip heading syntax from the source of an H1: the opening `#` and an
/// optional closing run of `#`s for ATX headings, the `===` underline for
/// setext headings.
fn heading_text(source: &str) -> &str {
    let source = source.trim();
    let Some(rest) = source.strip_prefix('#') else {
        return source.lines().next().unwrap_or_default().trim();
    };
    let rest = rest.trim();
    let unclosed = rest.trim_end_matches('#');
    if unclosed.len() == rest.len() {
        rest
    } else if unclosed.is_empty() || unclosed.ends_with([' ', '\t']) {
        unclosed.trim_end()
    } else {
        rest
    }
}

/// Content after the leading `---` header block, or all of it
fn body(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return content,
    }

    let mut offset = 0;
    let header_start = content.find('\n').map_or(content.len(), |i| i + 1);
    for line in content[header_start..].split_inclusive('\n') {
        offset += line.len();
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            return &content[header_start + offset..];
        }
    }
    content
}

/// First `length` characters of the body on one line
fn preview(body: &str, length: usize) -> Option<String> {
    let body = body.trim_start();
    if body.is_empty() || length == 0 {
        return None;
    }
    let mut chars = body.chars();
    let excerpt: String = chars
        .by_ref()
        .take(length)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let excerpt = excerpt.trim_end();
    if excerpt.is_empty() {
        return None;
    }
    if chars.next().is_some() {
        Some(format!("{}...", excerpt))
    } else {
        Some(excerpt.to_string())
    }
}
