//! Diagnostics derived from the link graph

use super::note::{Note, NoteId};
use super::registry::NoteRegistry;
use serde::Serialize;

/// A diagnostic attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No outbound and no inbound links
    Unconnected { label: String },
    /// Links that resolve to no note
    DeadLinks { label: String, count: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconnected { label } => write!(
                f,
                "Unconnected: Note '{}' has no connection to any other note.",
                label
            ),
            Self::DeadLinks { label, count } => write!(
                f,
                "Dead links: Note '{}' contains {} link(s) to notes that do not exist.",
                label, count
            ),
        }
    }
}

/// Rules applied when recomputing a note's warnings
///
/// `Unconnected` is always checked. `DeadLinks` is opt-in.
#[derive(Debug, Clone, Default)]
pub struct WarningChecker {
    dead_links: bool,
}

impl WarningChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also report notes that contain unresolved links
    pub fn with_dead_links(mut self, enabled: bool) -> Self {
        self.dead_links = enabled;
        self
    }

    /// Compute the full warning list for a note from its current adjacency.
    pub fn check(&self, note: &Note) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if note.is_unconnected() {
            warnings.push(Warning::Unconnected { label: note.label() });
        }
        if self.dead_links && !note.dead_links.is_empty() {
            warnings.push(Warning::DeadLinks {
                label: note.label(),
                count: note.dead_links.len(),
            });
        }
        warnings
    }
}

impl NoteRegistry {
    /// Recompute warnings for the given notes, replacing what they had.
    ///
    /// Identifiers that are no longer registered are skipped.
    pub fn refresh_warnings<'a>(&mut self, ids: impl IntoIterator<Item = &'a NoteId>) {
        let checker = &self.checker;
        for id in ids {
            if let Some(note) = self.notes.get_mut(id) {
                note.warnings = checker.check(note);
            }
        }
    }
}
