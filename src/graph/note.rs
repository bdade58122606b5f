//! Note representation in the link index

use super::warnings::Warning;
use crate::analysis::LinkToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Format used when a note falls back to its creation time as label.
pub const LABEL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique, immutable identifier of a note
///
/// Serializes as a plain string. The identifier doubles as the file stem
/// of the note's backing resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a NoteId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier can name a file inside the notes folder.
    ///
    /// Rejects empty identifiers, path separators and the `.`/`..` entries.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self.0.contains(['/', '\\'])
            && !self.0.chars().any(char::is_control)
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for NoteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A note ("zettel") and its place in the link graph
///
/// Edges are stored as identifiers; the registry resolves them to notes
/// at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// First level-1 heading of the content
    pub title: Option<String>,
    /// From the `Created:` header, else `registered_at`
    pub created_at: DateTime<Utc>,
    /// When the note entered the index
    #[serde(skip)]
    pub registered_at: DateTime<Utc>,
    /// Short excerpt of the body, used as label when there is no title
    pub preview: Option<String>,
    /// Link tokens parsed from the current content, in document order
    pub links: Vec<LinkToken>,
    /// One entry per resolved link occurrence, in document order
    pub outbound: Vec<NoteId>,
    /// Notes whose outbound links contain this note
    pub inbound: BTreeSet<NoteId>,
    /// Tokens that did not resolve to any note
    pub dead_links: Vec<LinkToken>,
    /// Diagnostics derived from the current adjacency
    pub warnings: Vec<Warning>,
}

impl Note {
    /// Create an unlinked note with no content, registered at `created_at`
    pub fn new(id: NoteId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: None,
            created_at,
            registered_at: created_at,
            preview: None,
            links: Vec::new(),
            outbound: Vec::new(),
            inbound: BTreeSet::new(),
            dead_links: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Display string: title, else preview, else creation time
    pub fn label(&self) -> String {
        self.title
            .iter()
            .chain(self.preview.iter())
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.created_display())
    }

    /// Formatted creation time
    pub fn created_display(&self) -> String {
        self.created_at.format(LABEL_TIME_FORMAT).to_string()
    }

    /// True if the note links nowhere and nothing links to it
    pub fn is_unconnected(&self) -> bool {
        self.outbound.is_empty() && self.inbound.is_empty()
    }
}
