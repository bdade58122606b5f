//! In-process note store, for tests and embedders

use super::traits::{NoteStore, StorageError, StorageResult};
use crate::graph::NoteId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const MEMORY_EXTENSION: &str = ".md";

/// Map-backed note store
///
/// Paths are virtual: `path_for` yields `<id>.md` under a fixed root so
/// file-system signals can be simulated.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: Mutex<BTreeMap<NoteId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notes(&self) -> MutexGuard<'_, BTreeMap<NoteId, String>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put content in place without going through the engine
    pub fn insert(&self, id: impl Into<NoteId>, content: impl Into<String>) {
        self.notes().insert(id.into(), content.into());
    }

    /// Remove content without going through the engine
    pub fn delete(&self, id: &NoteId) -> Option<String> {
        self.notes().remove(id)
    }

    pub fn root() -> &'static Path {
        Path::new("/memory")
    }

    pub fn path_for(&self, id: &NoteId) -> PathBuf {
        Self::root().join(format!("{}{}", id, MEMORY_EXTENSION))
    }
}

impl NoteStore for MemoryStore {
    fn list_ids(&self) -> StorageResult<Vec<NoteId>> {
        Ok(self.notes().keys().cloned().collect())
    }

    fn read(&self, id: &NoteId) -> StorageResult<Option<String>> {
        Ok(self.notes().get(id).cloned())
    }

    fn write_new(&self, id: &NoteId, content: &str) -> StorageResult<()> {
        if !id.is_valid() {
            return Err(StorageError::InvalidPath(self.path_for(id)));
        }
        let mut notes = self.notes();
        if notes.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.clone()));
        }
        notes.insert(id.clone(), content.to_string());
        Ok(())
    }

    fn write(&self, id: &NoteId, content: &str) -> StorageResult<()> {
        if !id.is_valid() {
            return Err(StorageError::InvalidPath(self.path_for(id)));
        }
        self.notes().insert(id.clone(), content.to_string());
        Ok(())
    }

    fn id_for_path(&self, path: &Path) -> Option<NoteId> {
        if path.parent()? != Self::root() {
            return None;
        }
        let stem = path.file_name()?.to_str()?.strip_suffix(MEMORY_EXTENSION)?;
        (!stem.is_empty()).then(|| NoteId::from(stem))
    }
}
