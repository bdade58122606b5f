//! Storage trait definitions

use crate::graph::NoteId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Note already exists: {0}")]
    AlreadyExists(NoteId),

    #[error("Path is not a note in this store: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Backing content for notes
///
/// Each note id names exactly one resource. Implementations must be
/// thread-safe (Send + Sync); the engine shares one store across the
/// watcher loop and callers.
pub trait NoteStore: Send + Sync {
    /// Identifiers of every note resource currently present
    fn list_ids(&self) -> StorageResult<Vec<NoteId>>;

    /// Content of a note, `None` if there is no resource for `id`
    fn read(&self, id: &NoteId) -> StorageResult<Option<String>>;

    /// Create the resource for `id`. Fails with `AlreadyExists` rather
    /// than overwrite.
    fn write_new(&self, id: &NoteId, content: &str) -> StorageResult<()>;

    /// Replace the content of `id`, creating it if needed
    fn write(&self, id: &NoteId, content: &str) -> StorageResult<()>;

    /// The note id a path refers to, if the path belongs to this store
    fn id_for_path(&self, path: &Path) -> Option<NoteId>;
}
