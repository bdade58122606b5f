//! ZettelEngine: the main entry point for the link index
//!
//! One engine per notes folder. It owns the registry, the note store, the
//! event bus and the active-note pointer. Each mutation runs to completion
//! under the registry's write lock; events fire after the lock is
//! released, so handlers may call back into the engine.

use super::note::{Note, NoteId};
use super::registry::NoteRegistry;
use super::resolver::resolve_token;
use super::warnings::WarningChecker;
use crate::analysis::{LinkKind, LinkParser, LinkToken, NoteAnalyzer, ParsedNote};
use crate::config::{Config, ConfigError};
use crate::events::{EventBus, Topic};
use crate::ids::{IdGenerator, IdPolicy};
use crate::storage::{NoteStore, StorageError};
use crate::template::{format_content, stamp_modified};
use crate::watch::FsSignal;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors that can occur in engine operations
#[derive(Debug, Error)]
pub enum ZettelError {
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(NoteId),

    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("No identifiers left to allocate")]
    IdsExhausted,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type for engine operations
pub type ZettelResult<T> = Result<T, ZettelError>;

/// Request for a new note
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    /// Identifier to use instead of the generated one
    pub id: Option<NoteId>,
    /// Initial `# title` line
    pub title: Option<String>,
}

impl NewNote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The link index over one notes folder
pub struct ZettelEngine {
    registry: RwLock<NoteRegistry>,
    store: Arc<dyn NoteStore>,
    analyzer: NoteAnalyzer,
    ids: IdGenerator,
    events: EventBus,
    active: Mutex<Option<NoteId>>,
}

impl std::fmt::Debug for ZettelEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZettelEngine")
            .field("notes", &self.len())
            .field("ids", &self.ids)
            .field("events", &self.events)
            .finish()
    }
}

impl ZettelEngine {
    /// Create an engine with default settings. The registry starts empty;
    /// call [`reload_all`](Self::reload_all) to index the store.
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_parts(
            store,
            NoteAnalyzer::default(),
            WarningChecker::new(),
            IdPolicy::default(),
        )
    }

    /// Create an engine set up from a [`Config`]
    pub fn with_config(store: Arc<dyn NoteStore>, config: &Config) -> Self {
        let analyzer = NoteAnalyzer::new(LinkParser::new(&config.url_scheme))
            .with_preview_length(config.preview_length);
        let checker = WarningChecker::new().with_dead_links(config.warn_dead_links);
        Self::with_parts(store, analyzer, checker, config.id_policy())
    }

    fn with_parts(
        store: Arc<dyn NoteStore>,
        analyzer: NoteAnalyzer,
        checker: WarningChecker,
        policy: IdPolicy,
    ) -> Self {
        Self {
            registry: RwLock::new(NoteRegistry::with_checker(checker)),
            store,
            analyzer,
            ids: IdGenerator::new(policy),
            events: EventBus::new(),
            active: Mutex::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NoteRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NoteRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    /// The bus on which note events are published
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Scheme recognised in `<scheme>://id` links
    pub fn url_scheme(&self) -> &str {
        self.analyzer.parser().scheme()
    }

    // === Indexing ===

    /// Rebuild the whole index from the store.
    ///
    /// Every note is read and parsed before any note is linked. Notes that
    /// cannot be read are skipped with a warning. Fires no events.
    pub fn reload_all(&self) -> ZettelResult<usize> {
        let ids = self.store.list_ids()?;
        let mut parsed = Vec::with_capacity(ids.len());

        for id in ids {
            self.ids.observe(&id);
            match self.store.read(&id) {
                Ok(Some(content)) => {
                    let note = self.analyzer.analyze(&id, &content);
                    parsed.push((id, note));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(note = %id, error = %e, "skipping unreadable note"),
            }
        }

        let mut registry = self.write();
        registry.clear();
        for (id, note) in parsed {
            if let Err(e) = registry.create(id.clone(), None) {
                tracing::warn!(note = %id, error = %e, "skipping note");
                continue;
            }
            registry.apply_content(&id, note);
        }
        let count = registry.relink_all();
        let warned = registry.list_all().filter(|n| !n.warnings.is_empty()).count();
        drop(registry);

        tracing::info!(notes = count, warned, "reloaded notes");
        Ok(count)
    }

    /// Register an empty note without touching the store.
    ///
    /// Notes already linking to `id` are relinked to it. Fires `Create`.
    pub fn create(&self, id: NoteId, created_at: Option<DateTime<Utc>>) -> ZettelResult<Note> {
        if !id.is_valid() {
            return Err(ZettelError::InvalidIdentifier(id.to_string()));
        }
        let note = {
            let mut registry = self.write();
            registry.create(id.clone(), created_at)?;
            registry.admit(&id, ParsedNote::default());
            registry.lookup(&id).cloned()
        }
        .ok_or_else(|| ZettelError::NoteNotFound(id.clone()))?;

        self.ids.observe(&id);
        self.events.fire(Topic::Create, &note);
        Ok(note)
    }

    /// Bring one note in line with its backing content.
    ///
    /// Content present: the note is indexed (`Create`) or updated
    /// (`Change`). Content gone: the note is removed (`Delete`). Returns
    /// the topic fired, if any.
    pub fn refresh(&self, id: &NoteId) -> ZettelResult<Option<Topic>> {
        let Some(content) = self.store.read(id)? else {
            return match self.remove(id) {
                Ok(_) => Ok(Some(Topic::Delete)),
                Err(ZettelError::NoteNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            };
        };
        let parsed = self.analyzer.analyze(id, &content);

        let (topic, note) = {
            let mut registry = self.write();
            let topic = if registry.contains(id) {
                registry.update(id, parsed);
                Topic::Change
            } else {
                registry.create(id.clone(), None)?;
                registry.admit(id, parsed);
                Topic::Create
            };
            (topic, registry.lookup(id).cloned())
        };
        let note = note.ok_or_else(|| ZettelError::NoteNotFound(id.clone()))?;

        if topic == Topic::Create {
            self.ids.observe(id);
        }
        self.events.fire(topic, &note);
        Ok(Some(topic))
    }

    /// Drop a note from the index and retract all of its edges.
    ///
    /// The backing content is left alone. Fires `Delete` with the removed
    /// note, which no longer has any edges.
    pub fn remove(&self, id: &NoteId) -> ZettelResult<Note> {
        let (note, touched) = self
            .write()
            .remove(id)
            .ok_or_else(|| ZettelError::NoteNotFound(id.clone()))?;

        tracing::debug!(note = %id, neighbours = touched.len(), "removed note");
        self.clear_active_if(id);
        self.events.fire(Topic::Delete, &note);
        Ok(note)
    }

    /// Dispatch a file-system signal.
    ///
    /// The signal only says which note to look at: the store decides
    /// whether it now exists. Paths outside the store are ignored.
    pub fn apply(&self, signal: &FsSignal) -> ZettelResult<Option<Topic>> {
        match self.store.id_for_path(&signal.path) {
            Some(id) => self.refresh(&id),
            None => {
                tracing::trace!(path = %signal.path.display(), "ignoring foreign path");
                Ok(None)
            }
        }
    }

    // === Creating notes ===

    /// Register `id` and write `content` as its new backing resource.
    ///
    /// An existing resource is never overwritten. If the write fails the
    /// registration is rolled back and the error returned. Fires `Create`.
    pub fn write_new(&self, id: NoteId, content: &str) -> ZettelResult<Note> {
        self.write_new_at(id, content, None)
    }

    fn write_new_at(
        &self,
        id: NoteId,
        content: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> ZettelResult<Note> {
        if !id.is_valid() {
            return Err(ZettelError::InvalidIdentifier(id.to_string()));
        }
        let parsed = self.analyzer.analyze(&id, content);

        let note = {
            let mut registry = self.write();
            registry.create(id.clone(), created_at)?;
            if let Err(e) = self.store.write_new(&id, content) {
                registry.remove(&id);
                tracing::warn!(note = %id, error = %e, "could not write new note");
                return Err(e.into());
            }
            registry.admit(&id, parsed);
            registry.lookup(&id).cloned()
        }
        .ok_or_else(|| ZettelError::NoteNotFound(id.clone()))?;

        self.ids.observe(&id);
        tracing::info!(note = %id, "created note");
        self.events.fire(Topic::Create, &note);
        Ok(note)
    }

    /// Allocate an identifier if none is given, write the initial content
    /// and index the note.
    pub fn new_note(&self, request: NewNote) -> ZettelResult<Note> {
        let (id, created) = match request.id {
            Some(id) => (id, None),
            None => self.ids.next()?,
        };
        let created = created.unwrap_or_else(Utc::now);
        let content = format_content(&id, &created, request.title.as_deref());
        self.write_new_at(id, &content, Some(created))
    }

    /// Allocate the next identifier without creating a note
    pub fn next_id(&self) -> ZettelResult<NoteId> {
        Ok(self.ids.next()?.0)
    }

    /// Convert clipboard-style text into an identifier
    pub fn id_from_text(&self, text: &str) -> Option<NoteId> {
        self.ids.id_from_text(text)
    }

    /// Follow a link, creating its target when it does not resolve.
    ///
    /// A reference or URL link creates a note with that id; a wiki link
    /// creates a note with a generated id and that title.
    pub fn follow(&self, token: &LinkToken) -> ZettelResult<Note> {
        if let Some(note) = self.resolve(token) {
            return Ok(note);
        }
        let request = match token.kind {
            LinkKind::Wiki => NewNote::new().with_title(token.payload.as_str()),
            LinkKind::Reference | LinkKind::Url => NewNote::new().with_id(token.payload.as_str()),
        };
        tracing::debug!(link = %token, "creating note for dead link");
        self.new_note(request)
    }

    /// Rewrite the `Modified:` header line of a note to now.
    ///
    /// Returns false if the content has no such line.
    pub fn touch(&self, id: &NoteId) -> ZettelResult<bool> {
        let content = self
            .store
            .read(id)?
            .ok_or_else(|| ZettelError::NoteNotFound(id.clone()))?;
        let Some(stamped) = stamp_modified(&content, &Utc::now()) else {
            return Ok(false);
        };
        self.store.write(id, &stamped)?;
        self.refresh(id)?;
        Ok(true)
    }

    // === Reading ===

    pub fn lookup(&self, id: &str) -> Option<Note> {
        self.read().lookup(id).cloned()
    }

    pub fn lookup_by_title(&self, title: &str) -> Option<Note> {
        self.read().lookup_by_title(title).cloned()
    }

    /// Snapshot of every note, sorted by id
    pub fn list_all(&self) -> Vec<Note> {
        let mut notes: Vec<_> = self.read().list_all().cloned().collect();
        notes.sort_by(|a, b| a.id.cmp(&b.id));
        notes
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The note a token currently resolves to
    pub fn resolve(&self, token: &LinkToken) -> Option<Note> {
        let registry = self.read();
        let id = resolve_token(token, &*registry)?;
        registry.lookup(id).cloned()
    }

    /// The link token of note `id` covering byte `position`, if any
    pub fn link_at(&self, id: &str, position: usize) -> Option<LinkToken> {
        self.read().lookup(id).and_then(|note| {
            note.links
                .iter()
                .find(|t| t.position <= position && position < t.position + t.length)
                .cloned()
        })
    }

    /// Notes linking to `id`, sorted by id
    pub fn inbound(&self, id: &str) -> ZettelResult<Vec<Note>> {
        let registry = self.read();
        let note = registry
            .lookup(id)
            .ok_or_else(|| ZettelError::NoteNotFound(NoteId::from(id)))?;
        Ok(note
            .inbound
            .iter()
            .filter_map(|source| registry.lookup(source).cloned())
            .collect())
    }

    /// Notes `id` links to, one per link occurrence in document order
    pub fn outbound(&self, id: &str) -> ZettelResult<Vec<Note>> {
        let registry = self.read();
        let note = registry
            .lookup(id)
            .ok_or_else(|| ZettelError::NoteNotFound(NoteId::from(id)))?;
        Ok(note
            .outbound
            .iter()
            .filter_map(|target| registry.lookup(target).cloned())
            .collect())
    }

    /// Notes that currently carry at least one warning, sorted by id
    pub fn with_warnings(&self) -> Vec<Note> {
        let mut notes: Vec<_> = self
            .read()
            .list_all()
            .filter(|note| !note.warnings.is_empty())
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.id.cmp(&b.id));
        notes
    }

    // === Editor lifecycle ===

    /// Make `id` the active note. Fires `ActiveChange`.
    pub fn activate(&self, id: &str) -> ZettelResult<Note> {
        let note = self
            .lookup(id)
            .ok_or_else(|| ZettelError::NoteNotFound(NoteId::from(id)))?;
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(note.id.clone());
        self.events.fire(Topic::ActiveChange, &note);
        Ok(note)
    }

    /// Forget the active note
    pub fn deactivate(&self) -> Option<NoteId> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn clear_active_if(&self, id: &NoteId) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref() == Some(id) {
            *active = None;
        }
    }

    /// The active note, if it is still indexed
    pub fn active(&self) -> Option<Note> {
        let id = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        self.lookup(id.as_str())
    }

    /// Fires `Open` for `id`
    pub fn open(&self, id: &str) -> ZettelResult<Note> {
        self.lifecycle(Topic::Open, id)
    }

    /// Fires `Close` for `id`
    pub fn close(&self, id: &str) -> ZettelResult<Note> {
        self.lifecycle(Topic::Close, id)
    }

    fn lifecycle(&self, topic: Topic, id: &str) -> ZettelResult<Note> {
        let note = self
            .lookup(id)
            .ok_or_else(|| ZettelError::NoteNotFound(NoteId::from(id)))?;
        self.events.fire(topic, &note);
        Ok(note)
    }
}
