//! Configuration
//!
//! Read from YAML. The first file found wins:
//! - an explicit path
//! - `<workspace>/.zettel.yaml`
//! - `<config dir>/zettel/config.yaml`
//!
//! With no file at all, defaults apply. `${workspaceFolder}` and
//! `${env:NAME}` are expanded in `notes_folder`, and a relative folder is
//! taken relative to the workspace.

use crate::analysis::{DEFAULT_PREVIEW_LENGTH, DEFAULT_URL_SCHEME};
use crate::ids::{is_valid_format, IdPolicy, DEFAULT_ID_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the workspace root
pub const CONFIG_FILE_NAME: &str = ".zettel.yaml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Identifier policy as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicyKind {
    #[default]
    Timestamp,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the notes, may contain `${...}` variables
    pub notes_folder: String,
    /// Extension of note files, including the dot
    pub extension: String,
    pub id_policy: IdPolicyKind,
    /// strftime layout for timestamp identifiers
    pub id_format: String,
    /// Scheme recognised in `<scheme>://id` links
    pub url_scheme: String,
    /// Characters of body text kept in a note's preview
    pub preview_length: usize,
    /// Report notes that contain unresolved links
    pub warn_dead_links: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_folder: ".".to_string(),
            extension: ".md".to_string(),
            id_policy: IdPolicyKind::default(),
            id_format: DEFAULT_ID_FORMAT.to_string(),
            url_scheme: DEFAULT_URL_SCHEME.to_string(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
            warn_dead_links: false,
        }
    }
}

impl Config {
    /// Parse and validate YAML text
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// `<config dir>/zettel/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zettel").join("config.yaml"))
    }

    /// The config file that `load` would read, if any
    pub fn discover(workspace: &Path) -> Option<PathBuf> {
        std::iter::once(workspace.join(CONFIG_FILE_NAME))
            .chain(Self::user_config_path())
            .find(|path| path.is_file())
    }

    /// Load from `explicit`, else from the first discovered file, else
    /// use defaults.
    pub fn load(explicit: Option<&Path>, workspace: &Path) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        match Self::discover(workspace) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => {
                tracing::debug!(workspace = %workspace.display(), "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.notes_folder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "notes_folder cannot be empty".to_string(),
            ));
        }
        if self.extension.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "extension must not contain a path separator, got: {}",
                self.extension
            )));
        }
        if !is_valid_format(&self.id_format) || self.id_format.is_empty() {
            return Err(ConfigError::Validation(format!(
                "id_format is not a valid strftime format: {}",
                self.id_format
            )));
        }
        let scheme_ok = self
            .url_scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .url_scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(ConfigError::Validation(format!(
                "url_scheme is not a valid URL scheme: {}",
                self.url_scheme
            )));
        }
        Ok(())
    }

    /// Absolute notes folder for `workspace`
    pub fn notes_folder(&self, workspace: &Path) -> PathBuf {
        let expanded = expand_vars(&self.notes_folder, workspace);
        let folder = PathBuf::from(expanded);
        if folder.is_absolute() {
            folder
        } else {
            workspace.join(folder)
        }
    }

    pub fn id_policy(&self) -> IdPolicy {
        match self.id_policy {
            IdPolicyKind::Timestamp => IdPolicy::Timestamp {
                format: self.id_format.clone(),
            },
            IdPolicyKind::Count => IdPolicy::Count,
        }
    }
}

/// Expand `${workspaceFolder}` and `${env:NAME}`.
///
/// Unset environment variables expand to nothing. Unknown `${...}`
/// sequences are left as they are.
pub fn expand_vars(value: &str, workspace: &Path) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if name == "workspaceFolder" {
            out.push_str(&workspace.to_string_lossy());
        } else if let Some(var) = name.strip_prefix("env:") {
            out.push_str(&std::env::var(var).unwrap_or_default());
        } else {
            out.push_str(&rest[start..start + 2 + end + 1]);
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
