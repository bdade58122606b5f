//! Content analysis for notes
//!
//! Turns the raw text of a note into what the link index needs: title,
//! creation time, preview and the ordered list of link tokens. Nothing in
//! here looks at other notes; resolution happens in the graph module.
//!
//! # Example
//!
//! ```
//! use zettel::analysis::{LinkKind, NoteAnalyzer};
//! use zettel::NoteId;
//!
//! let parsed = NoteAnalyzer::default().analyze(&NoteId::from("1001"), "# Title\nSee [#1002].");
//! assert_eq!(parsed.title.as_deref(), Some("Title"));
//! assert_eq!(parsed.links[0].kind, LinkKind::Reference);
//! ```

mod header;
mod links;

pub use header::{parse_timestamp, NoteAnalyzer, ParsedNote, DEFAULT_PREVIEW_LENGTH};
pub use links::{
    is_link_identifier, parse_links, LinkKind, LinkParser, LinkTarget, LinkToken,
    DEFAULT_URL_SCHEME,
};
