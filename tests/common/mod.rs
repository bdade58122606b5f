//! Common test utilities for the integration tests
//!
//! Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use zettel::template::format_content;
use zettel::{FolderStore, Note, NoteId, ZettelEngine};

/// A temporary notes folder backed by a `FolderStore`
pub struct NoteFolder {
    pub dir: TempDir,
    pub store: Arc<FolderStore>,
}

impl NoteFolder {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(FolderStore::open(dir.path(), ".md").expect("open store"));
        Self { dir, store }
    }

    pub fn path(&self, id: &str) -> PathBuf {
        self.store.path_for(&NoteId::from(id))
    }

    pub fn write(&self, id: &str, content: &str) -> PathBuf {
        let path = self.path(id);
        std::fs::write(&path, content).expect("write note");
        path
    }

    /// Write a note with the standard header, created at a fixed time
    pub fn write_note(&self, id: &str, title: Option<&str>, body: &str) -> PathBuf {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut content = format_content(&NoteId::from(id), &created, title);
        content.push_str(body);
        self.write(id, &content)
    }

    pub fn delete(&self, id: &str) -> PathBuf {
        let path = self.path(id);
        std::fs::remove_file(&path).expect("remove note");
        path
    }

    pub fn read(&self, id: &str) -> String {
        std::fs::read_to_string(self.path(id)).expect("read note")
    }

    /// An engine over this folder with the index already built
    pub fn engine(&self) -> ZettelEngine {
        let engine = ZettelEngine::new(self.store.clone());
        engine.reload_all().expect("reload");
        engine
    }
}

/// Ids of `notes`, in order
pub fn ids(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|n| n.id.to_string()).collect()
}

/// Panics unless every edge in the index has its mirror image.
pub fn assert_symmetric(engine: &ZettelEngine) {
    for note in engine.list_all() {
        for target in &note.outbound {
            let target = engine
                .lookup(target.as_str())
                .unwrap_or_else(|| panic!("{} links to unknown {}", note.id, target));
            assert!(
                target.inbound.contains(&note.id),
                "{} -> {} missing from inbound",
                note.id,
                target.id
            );
        }
        for source in &note.inbound {
            let source = engine
                .lookup(source.as_str())
                .unwrap_or_else(|| panic!("{} has unknown inbound {}", note.id, source));
            assert!(
                source.outbound.contains(&note.id),
                "{} <- {} missing from outbound",
                note.id,
                source.id
            );
        }
    }
}

/// Panics unless each note's edges are exactly what its links resolve to now.
pub fn assert_resolved(engine: &ZettelEngine) {
    for note in engine.list_all() {
        let mut outbound = Vec::new();
        let mut dead = Vec::new();
        for token in &note.links {
            match engine.resolve(token) {
                Some(target) => outbound.push(target.id),
                None => dead.push(token.clone()),
            }
        }
        assert_eq!(note.outbound, outbound, "outbound of {}", note.id);
        assert_eq!(note.dead_links, dead, "dead links of {}", note.id);
    }
}
