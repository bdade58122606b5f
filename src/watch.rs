//! File-system watching
//!
//! A `notify` watcher on the notes folder turns events into [`FsSignal`]s
//! and sends them down a tokio channel. [`drive`] applies them to an
//! engine one at a time, in arrival order.

use crate::graph::{ZettelEngine, ZettelResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// What the file system reported for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Created,
    Changed,
    Deleted,
}

/// A per-path change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsSignal {
    pub kind: SignalKind,
    pub path: PathBuf,
}

impl FsSignal {
    pub fn new(kind: SignalKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() > extension.len() && name.ends_with(extension))
}

/// Translate a watcher event into signals for note files.
///
/// A path that no longer exists is always reported as deleted, whatever
/// the event kind; renames arrive that way. Access events are dropped.
pub fn signals_from_event(event: &Event, extension: &str) -> Vec<FsSignal> {
    if event.kind.is_access() {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| has_extension(path, extension))
        .map(|path| {
            let kind = if event.kind.is_remove() || !path.exists() {
                SignalKind::Deleted
            } else if event.kind.is_create() {
                SignalKind::Created
            } else {
                SignalKind::Changed
            };
            FsSignal::new(kind, path.clone())
        })
        .collect()
}

/// Watches the notes folder until dropped
pub struct FolderWatcher {
    _watcher: RecommendedWatcher,
    folder: PathBuf,
}

impl FolderWatcher {
    /// Start watching `folder` (not recursively), sending a signal for
    /// each note file event.
    ///
    /// Signals are fire-and-forget: once the receiver is gone they are
    /// dropped.
    pub fn start(
        folder: impl AsRef<Path>,
        extension: &str,
        tx: UnboundedSender<FsSignal>,
    ) -> ZettelResult<Self> {
        let folder = folder.as_ref().to_path_buf();
        let extension = extension.to_string();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for signal in signals_from_event(&event, &extension) {
                        let _ = tx.send(signal);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "watch error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&folder, RecursiveMode::NonRecursive)?;

        tracing::info!(folder = %folder.display(), "watching notes folder");
        Ok(Self {
            _watcher: watcher,
            folder,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

/// Apply signals from `rx` until every sender is gone.
///
/// A signal that fails is logged and does not stop the loop. Returns the
/// number of signals that changed the index.
pub async fn drive(engine: &ZettelEngine, rx: &mut UnboundedReceiver<FsSignal>) -> usize {
    let mut applied = 0;
    while let Some(signal) = rx.recv().await {
        match engine.apply(&signal) {
            Ok(Some(topic)) => {
                tracing::debug!(path = %signal.path.display(), %topic, "applied signal");
                applied += 1;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %signal.path.display(), error = %e, "failed to apply signal")
            }
        }
    }
    applied
}
