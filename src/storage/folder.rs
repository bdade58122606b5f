//! Folder storage backend
//!
//! One file per note, named `<id><extension>`, directly inside the notes
//! folder. Subfolders are not scanned.

use super::traits::{NoteStore, StorageError, StorageResult};
use crate::graph::NoteId;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed note store
#[derive(Debug, Clone)]
pub struct FolderStore {
    folder: PathBuf,
    extension: String,
}

impl FolderStore {
    /// Open the notes folder, creating it if it does not exist.
    ///
    /// `extension` may be given with or without the leading dot.
    pub fn open(folder: impl AsRef<Path>, extension: &str) -> StorageResult<Self> {
        std::fs::create_dir_all(folder.as_ref())?;
        let folder = folder.as_ref().canonicalize()?;
        let extension = if extension.is_empty() || extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };
        Ok(Self { folder, extension })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file backing `id`
    pub fn path_for(&self, id: &NoteId) -> PathBuf {
        self.folder.join(format!("{}{}", id, self.extension))
    }

    fn checked_path(&self, id: &NoteId) -> StorageResult<PathBuf> {
        let path = self.path_for(id);
        if !id.is_valid() {
            return Err(StorageError::InvalidPath(path));
        }
        Ok(path)
    }

    fn stem<'a>(&self, name: &'a str) -> Option<&'a str> {
        let stem = name.strip_suffix(self.extension.as_str())?;
        (!stem.is_empty() && !stem.starts_with('.')).then_some(stem)
    }
}

impl NoteStore for FolderStore {
    fn list_ids(&self) -> StorageResult<Vec<NoteId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.folder)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if let Some(stem) = self.stem(name) {
                ids.push(NoteId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read(&self, id: &NoteId) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.checked_path(id)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_new(&self, id: &NoteId, content: &str) -> StorageResult<()> {
        let path = self.checked_path(id)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write(&self, id: &NoteId, content: &str) -> StorageResult<()> {
        std::fs::write(self.checked_path(id)?, content)?;
        Ok(())
    }

    fn id_for_path(&self, path: &Path) -> Option<NoteId> {
        let parent = path.parent()?;
        let same_folder = parent == self.folder
            || parent
                .canonicalize()
                .is_ok_and(|p| p == self.folder);
        if !same_folder {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        self.stem(name).map(NoteId::from)
    }
}
