//! Zettel: a bidirectional link index over a folder of notes
//!
//! Each note ("zettel") is a text file named after its immutable
//! identifier. Links inside note bodies are parsed, resolved to other
//! notes by identifier or title, and kept in an inbound/outbound index
//! that stays consistent as notes are created, edited and deleted.
//!
//! # Core Concepts
//!
//! - **Links**: `[[Title]]`, `[#id]` and `zettel://id`
//! - **Engine**: owns the registry, the note store and the event bus
//! - **Warnings**: diagnostics such as "unconnected note", recomputed on
//!   every change
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use zettel::{MemoryStore, ZettelEngine};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert("1001", "# Graph Theory\n");
//! store.insert("1002", "See [#1001].");
//!
//! let engine = ZettelEngine::new(store);
//! engine.reload_all().unwrap();
//! assert_eq!(engine.outbound("1002").unwrap()[0].label(), "Graph Theory");
//! ```

pub mod analysis;
pub mod config;
pub mod events;
mod graph;
pub mod ids;
pub mod storage;
pub mod template;
pub mod watch;

pub use analysis::{LinkKind, LinkToken};
pub use config::{Config, ConfigError};
pub use events::{EventBus, NoteEvent, Subscription, Topic};
pub use graph::{
    resolve, resolve_token, LinkLookup, NewNote, Note, NoteId, NoteRegistry, Resolution, Retitle,
    Touched, Warning, WarningChecker, ZettelEngine, ZettelError, ZettelResult, LABEL_TIME_FORMAT,
};
pub use ids::{IdGenerator, IdPolicy};
pub use storage::{FolderStore, MemoryStore, NoteStore, StorageError, StorageResult};
pub use watch::{FolderWatcher, FsSignal, SignalKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
