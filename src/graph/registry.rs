//! NoteRegistry: the in-memory index of notes
//!
//! Primary map by identifier, secondary index by title, and a reverse
//! "wanted" index from link targets to the notes whose content names
//! them. The graph maintenance operations live in `maintainer.rs`.

use super::engine::{ZettelError, ZettelResult};
use super::note::{Note, NoteId};
use super::resolver::LinkLookup;
use super::warnings::WarningChecker;
use crate::analysis::{LinkTarget, LinkToken, ParsedNote};
use chrono::{DateTime, Utc};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// A note's title before and after a content update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retitle {
    pub before: Option<String>,
    pub after: Option<String>,
    /// The title index entry for `after` was held by another note
    pub claimed: bool,
}

impl Retitle {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    /// Whether wiki links naming `before` or `after` may now resolve
    /// differently
    pub fn moves_index(&self) -> bool {
        self.changed() || self.claimed
    }
}

/// Entity store for notes
///
/// The title index holds the most recently processed note for each
/// title. An older note sharing that title stays reachable by id only.
#[derive(Debug, Default)]
pub struct NoteRegistry {
    pub(super) notes: HashMap<NoteId, Note>,
    pub(super) titles: HashMap<String, NoteId>,
    pub(super) wanted: HashMap<LinkTarget, BTreeSet<NoteId>>,
    pub(super) checker: WarningChecker,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checker(checker: WarningChecker) -> Self {
        Self {
            checker,
            ..Self::default()
        }
    }

    /// Register an empty note.
    ///
    /// Fails with `DuplicateIdentifier` if the id is taken; the registry
    /// is left unchanged in that case. `created_at` defaults to now.
    pub fn create(
        &mut self,
        id: NoteId,
        created_at: Option<DateTime<Utc>>,
    ) -> ZettelResult<&Note> {
        if self.notes.contains_key(&id) {
            return Err(ZettelError::DuplicateIdentifier(id));
        }
        let note = Note::new(id.clone(), created_at.unwrap_or_else(Utc::now));
        Ok(self.notes.entry(id).or_insert(note))
    }

    /// Get a note by id
    pub fn lookup<Q>(&self, id: &Q) -> Option<&Note>
    where
        NoteId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.notes.get(id)
    }

    /// Get the note currently holding `title`
    pub fn lookup_by_title(&self, title: &str) -> Option<&Note> {
        self.titles.get(title).and_then(|id| self.notes.get(id))
    }

    /// All notes, in no particular order
    pub fn list_all(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// All registered ids, sorted
    pub fn ids(&self) -> Vec<NoteId> {
        let mut ids: Vec<_> = self.notes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        NoteId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Drop every note and index entry
    pub fn clear(&mut self) {
        self.notes.clear();
        self.titles.clear();
        self.wanted.clear();
    }

    /// Store freshly parsed content on a note, without touching edges.
    ///
    /// Updates the title index and the wanted index. Returns `None` if the
    /// note is not registered.
    pub fn apply_content(&mut self, id: &NoteId, parsed: ParsedNote) -> Option<Retitle> {
        let note = self.notes.get_mut(id)?;
        note.created_at = parsed.created.unwrap_or(note.registered_at);
        note.preview = parsed.preview;
        let previous_links = std::mem::replace(&mut note.links, parsed.links);
        let before = std::mem::replace(&mut note.title, parsed.title);
        let after = note.title.clone();
        let current_links = note.links.clone();

        self.unwant(id, &previous_links);
        self.want(id, &current_links);

        if let Some(old) = &before {
            if self.titles.get(old) == Some(id) {
                self.titles.remove(old);
            }
        }
        let mut claimed = false;
        if let Some(new) = &after {
            let previous = self.titles.insert(new.clone(), id.clone());
            claimed = previous.is_some_and(|holder| &holder != id);
        }

        Some(Retitle {
            before,
            after,
            claimed,
        })
    }

    /// Notes whose links name any of `targets`, excluding `skip`
    pub(super) fn wanting(&self, targets: &[LinkTarget], skip: &NoteId) -> BTreeSet<NoteId> {
        targets
            .iter()
            .filter_map(|target| self.wanted.get(target))
            .flatten()
            .filter(|id| *id != skip)
            .cloned()
            .collect()
    }

    fn want(&mut self, id: &NoteId, links: &[LinkToken]) {
        for link in links {
            self.wanted
                .entry(link.target())
                .or_default()
                .insert(id.clone());
        }
    }

    pub(super) fn unwant(&mut self, id: &NoteId, links: &[LinkToken]) {
        for link in links {
            let target = link.target();
            if let Some(wanting) = self.wanted.get_mut(&target) {
                wanting.remove(id);
                if wanting.is_empty() {
                    self.wanted.remove(&target);
                }
            }
        }
    }
}

impl LinkLookup for NoteRegistry {
    fn find_id(&self, id: &str) -> Option<&NoteId> {
        self.notes.get_key_value(id).map(|(id, _)| id)
    }

    fn find_title(&self, title: &str) -> Option<&NoteId> {
        self.titles.get(title)
    }
}
