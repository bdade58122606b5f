//! Link tokenizer
//!
//! Scans note content for the three inline link forms:
//!
//! - `[[free text]]`: wiki link, resolved by title
//! - `[#id]`: reference link, resolved by identifier
//! - `<scheme>://id`: URL link, resolved by identifier
//!
//! Identifiers match `[0-9a-zA-Z_-]+`. Scanning is left to right and
//! tokens never overlap. Nothing here looks at the registry.

use crate::graph::NoteId;
use serde::Serialize;

/// URL scheme recognised when none is configured
pub const DEFAULT_URL_SCHEME: &str = "zettel";

/// Link classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// `[[...]]`, payload is a title
    Wiki,
    /// `[#...]`, payload is an identifier
    Reference,
    /// `<scheme>://...`, payload is an identifier
    Url,
}

/// What a token asks the resolver for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkTarget {
    Id(NoteId),
    Title(String),
}

/// A raw link occurrence
///
/// `position` and `length` are byte offsets into the scanned content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkToken {
    pub position: usize,
    pub length: usize,
    pub kind: LinkKind,
    pub payload: String,
}

impl LinkToken {
    /// The registry key this token resolves against
    pub fn target(&self) -> LinkTarget {
        match self.kind {
            LinkKind::Wiki => LinkTarget::Title(self.payload.clone()),
            LinkKind::Reference | LinkKind::Url => {
                LinkTarget::Id(NoteId::from(self.payload.as_str()))
            }
        }
    }

    /// The exact source text of the token
    pub fn source_text<'a>(&self, content: &'a str) -> Option<&'a str> {
        content.get(self.position..self.position + self.length)
    }
}

impl std::fmt::Display for LinkToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LinkKind::Wiki => write!(f, "[[{}]]", self.payload),
            LinkKind::Reference => write!(f, "[#{}]", self.payload),
            LinkKind::Url => write!(f, "<url>://{}", self.payload),
        }
    }
}

/// True for bytes allowed in a link identifier
fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Length of the identifier run at the start of `s`
fn id_len(s: &str) -> usize {
    s.bytes().take_while(|b| is_id_byte(*b)).count()
}

/// True if `s` is a non-empty run of identifier characters
pub fn is_link_identifier(s: &str) -> bool {
    !s.is_empty() && id_len(s) == s.len()
}

/// Tokenizer for inline links
#[derive(Debug, Clone)]
pub struct LinkParser {
    /// `<scheme>://`
    url_prefix: String,
}

impl Default for LinkParser {
    fn default() -> Self {
        Self::new(DEFAULT_URL_SCHEME)
    }
}

impl LinkParser {
    pub fn new(url_scheme: impl AsRef<str>) -> Self {
        Self {
            url_prefix: format!("{}://", url_scheme.as_ref()),
        }
    }

    /// The configured URL scheme, without `://`
    pub fn scheme(&self) -> &str {
        self.url_prefix.trim_end_matches("://")
    }

    /// Extract all link tokens from `content` in document order.
    pub fn parse(&self, content: &str) -> Vec<LinkToken> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let rest = &content[pos..];
            let matched = match_wiki(rest)
                .or_else(|| match_reference(rest))
                .or_else(|| self.match_url(content, pos));

            match matched {
                Some((length, kind, payload)) => {
                    tokens.push(LinkToken {
                        position: pos,
                        length,
                        kind,
                        payload: payload.to_string(),
                    });
                    pos += length;
                }
                None => {
                    pos += rest.chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        tokens
    }

    /// `<scheme>://id`, only where the scheme does not continue a word
    fn match_url<'a>(&self, content: &'a str, pos: usize) -> Option<(usize, LinkKind, &'a str)> {
        let rest = &content[pos..];
        let after = rest.strip_prefix(self.url_prefix.as_str())?;
        let glued = content[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        if glued {
            return None;
        }
        let n = id_len(after);
        if n == 0 {
            return None;
        }
        Some((self.url_prefix.len() + n, LinkKind::Url, &after[..n]))
    }
}

/// `[[text]]`, where text contains no `]`
fn match_wiki(rest: &str) -> Option<(usize, LinkKind, &str)> {
    let inner = rest.strip_prefix("[[")?;
    let end = inner.find(']')?;
    if !inner[end..].starts_with("]]") {
        return None;
    }
    Some((end + 4, LinkKind::Wiki, &inner[..end]))
}

/// `[#id]`
fn match_reference(rest: &str) -> Option<(usize, LinkKind, &str)> {
    let inner = rest.strip_prefix("[#")?;
    let n = id_len(inner);
    if n == 0 || inner.as_bytes().get(n) != Some(&b']') {
        return None;
    }
    Some((n + 3, LinkKind::Reference, &inner[..n]))
}

/// Tokenize with the default URL scheme
pub fn parse_links(content: &str) -> Vec<LinkToken> {
    LinkParser::default().parse(content)
}
