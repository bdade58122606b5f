//! The bidirectional link graph

mod engine;
mod maintainer;
mod note;
mod registry;
mod resolver;
mod warnings;

#[cfg(test)]
mod tests;

pub use engine::{NewNote, ZettelEngine, ZettelError, ZettelResult};
pub use maintainer::Touched;
pub use note::{Note, NoteId, LABEL_TIME_FORMAT};
pub use registry::{NoteRegistry, Retitle};
pub use resolver::{resolve, resolve_token, LinkLookup, Resolution};
pub use warnings::{Warning, WarningChecker};
