//! Change notification
//!
//! Registry mutations (change, create, delete) and editor lifecycle
//! signals (active, open, close) are published on an [`EventBus`]. Every
//! mutation is followed by a coalesced `TreeChange` delivery for the same
//! note.

mod bus;

pub use bus::{EventBus, NoteEvent, Subscription, Topic, EVENT_CHANNEL_CAPACITY};
