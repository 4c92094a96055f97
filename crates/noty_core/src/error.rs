use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for noty operations
#[derive(Debug, Error)]
pub enum NotyError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete file '{path}': {source}")]
    FileDelete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to rename '{from}' to '{to}': {source}")]
    FileRename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    // Lookup errors
    #[error("Note not found: '{0}'")]
    NotFound(PathBuf),

    #[error("No note is currently open")]
    NoOpenNote,

    // Conflicts
    #[error("A note already exists at '{0}'")]
    AlreadyExists(PathBuf),

    #[error("Invalid note name: '{0}'")]
    InvalidName(String),

    #[error("'{0}' was modified by another program since it was loaded")]
    ExternallyModified(PathBuf),

    // Config errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading, validating or persisting the configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{key}': expected {expected}, got {value}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: serde_json::Value,
    },

    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for noty operations
pub type Result<T> = std::result::Result<T, NotyError>;

impl NotyError {
    /// Short, stable name of the error variant (for display layers and logs)
    pub fn kind(&self) -> &'static str {
        match self {
            NotyError::Io(_) => "Io",
            NotyError::FileRead { .. } => "FileRead",
            NotyError::FileWrite { .. } => "FileWrite",
            NotyError::FileDelete { .. } => "FileDelete",
            NotyError::FileRename { .. } => "FileRename",
            NotyError::NotFound(_) => "NotFound",
            NotyError::NoOpenNote => "NoOpenNote",
            NotyError::AlreadyExists(_) => "AlreadyExists",
            NotyError::InvalidName(_) => "InvalidName",
            NotyError::ExternallyModified(_) => "ExternallyModified",
            NotyError::Config(_) => "Config",
        }
    }

    /// Path associated with the error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            NotyError::FileRead { path, .. }
            | NotyError::FileWrite { path, .. }
            | NotyError::FileDelete { path, .. }
            | NotyError::NotFound(path)
            | NotyError::AlreadyExists(path)
            | NotyError::ExternallyModified(path) => Some(path),
            NotyError::FileRename { from, .. } => Some(from),
            _ => None,
        }
    }

    /// True for "name taken" style failures, as opposed to I/O failures.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            NotyError::AlreadyExists(_) | NotyError::InvalidName(_)
        )
    }

    /// True when the target of the operation does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NotyError::NotFound(_) | NotyError::NoOpenNote)
    }
}
