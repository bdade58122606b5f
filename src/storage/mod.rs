//! Backing content for notes
//!
//! The engine reads and writes note content through the `NoteStore` trait.
//! `FolderStore` keeps one file per note in the notes folder; `MemoryStore`
//! keeps everything in process.

mod folder;
mod memory;
mod traits;

pub use folder::FolderStore;
pub use memory::MemoryStore;
pub use traits::{NoteStore, StorageError, StorageResult};
