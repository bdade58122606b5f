//! Incremental maintenance of the link graph
//!
//! Every operation here keeps `A.outbound ∋ B ⇔ B.inbound ∋ A` for all
//! notes. A note's previous edges are always retracted before its new
//! edges are installed. Callers hold the registry exclusively for the
//! whole operation, so readers never see the state in between.

use super::note::NoteId;
use super::registry::NoteRegistry;
use super::resolver::resolve;
use crate::analysis::{LinkTarget, ParsedNote};
use std::collections::BTreeSet;

/// Notes whose adjacency an operation changed
pub type Touched = BTreeSet<NoteId>;

impl NoteRegistry {
    /// Recompute one note's outbound edges from its parsed links.
    ///
    /// Does not recompute warnings.
    pub fn relink(&mut self, id: &NoteId) -> Touched {
        let mut touched = Touched::new();
        let Some(note) = self.notes.get_mut(id) else {
            return touched;
        };
        touched.insert(id.clone());
        let previous = std::mem::take(&mut note.outbound);
        let links = note.links.clone();

        for target in &previous {
            if let Some(neighbour) = self.notes.get_mut(target) {
                neighbour.inbound.remove(id);
            }
            touched.insert(target.clone());
        }

        let resolution = resolve(&links, self);

        for target in &resolution.outbound {
            if let Some(neighbour) = self.notes.get_mut(target) {
                neighbour.inbound.insert(id.clone());
            }
            touched.insert(target.clone());
        }

        tracing::debug!(
            note = %id,
            outbound = resolution.outbound.len(),
            dead = resolution.dead.len(),
            "relinked note"
        );

        if let Some(note) = self.notes.get_mut(id) {
            note.outbound = resolution.outbound;
            note.dead_links = resolution.dead;
        }
        touched
    }

    /// Relink every note whose links name one of `targets`.
    fn relink_wanting(&mut self, targets: &[LinkTarget], skip: &NoteId) -> Touched {
        let mut touched = Touched::new();
        for dependent in self.wanting(targets, skip) {
            touched.extend(self.relink(&dependent));
        }
        touched
    }

    /// Give a newly registered note its content and link it into the graph.
    ///
    /// Notes holding dead links to its id or its title now resolve to it.
    pub fn admit(&mut self, id: &NoteId, parsed: ParsedNote) -> Touched {
        let Some(retitle) = self.apply_content(id, parsed) else {
            return Touched::new();
        };
        let mut touched = self.relink(id);

        let mut targets = vec![LinkTarget::Id(id.clone())];
        targets.extend(retitle.after.map(LinkTarget::Title));
        touched.extend(self.relink_wanting(&targets, id));

        self.refresh_warnings(&touched);
        touched
    }

    /// Replace a note's content and bring the graph up to date.
    ///
    /// When the title changed, or the note took over a title another note
    /// held, notes linking to the old or the new title are relinked too.
    pub fn update(&mut self, id: &NoteId, parsed: ParsedNote) -> Touched {
        let Some(retitle) = self.apply_content(id, parsed) else {
            return Touched::new();
        };
        let mut touched = self.relink(id);

        if retitle.moves_index() {
            let targets: Vec<_> = [retitle.before, retitle.after]
                .into_iter()
                .flatten()
                .map(LinkTarget::Title)
                .collect();
            touched.extend(self.relink_wanting(&targets, id));
        }

        self.refresh_warnings(&touched);
        touched
    }

    /// Remove a note and every edge that mentions it.
    ///
    /// Former inbound neighbours are relinked, which turns their links to
    /// the removed note into dead links. The returned note has no edges.
    pub fn remove(&mut self, id: &NoteId) -> Option<(super::Note, Touched)> {
        let mut note = self.notes.remove(id)?;
        let mut touched = Touched::new();

        for target in &note.outbound {
            if let Some(neighbour) = self.notes.get_mut(target) {
                neighbour.inbound.remove(id);
                touched.insert(target.clone());
            }
        }

        if let Some(title) = &note.title {
            if self.titles.get(title) == Some(id) {
                self.titles.remove(title);
            }
        }
        self.unwant(id, &note.links);

        for source in &note.inbound {
            if source != id {
                touched.extend(self.relink(source));
            }
        }

        note.outbound.clear();
        note.inbound.clear();
        touched.remove(id);
        self.refresh_warnings(&touched);
        Some((note, touched))
    }

    /// Rebuild every edge from scratch.
    ///
    /// Expects the parse pass to be complete so that every title is known.
    pub fn relink_all(&mut self) -> usize {
        let ids = self.ids();
        for id in &ids {
            self.relink(id);
        }
        self.refresh_warnings(&ids);
        ids.len()
    }

    /// Check `A.outbound ∋ B ⇔ B.inbound ∋ A` over the whole registry.
    pub fn is_symmetric(&self) -> bool {
        let forward = self.notes.values().all(|note| {
            note.outbound.iter().all(|target| {
                self.notes
                    .get(target)
                    .is_some_and(|t| t.inbound.contains(&note.id))
            })
        });
        let backward = self.notes.values().all(|note| {
            note.inbound.iter().all(|source| {
                self.notes
                    .get(source)
                    .is_some_and(|s| s.outbound.contains(&note.id))
            })
        });
        forward && backward
    }
}
