//! Typed notifications.
//!
//! Two event families flow through [`CallbackRegistry`] instances:
//! [`ConfigEvent`] is published by the configuration store when a setting
//! changes, [`StoreEvent`] is published by the note store when the note
//! collection or the open note changes. Each variant maps to one named topic
//! (see `event_type()`).

mod callback_registry;

pub use callback_registry::{CallbackRegistry, EventCallback, SubscriptionId};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{SortingMethod, Theme};

/// Setting changes published by [`ConfigStore::set`](crate::config::ConfigStore::set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ConfigEvent {
    /// The notes directory moved; payload is the new root.
    NotesDirChanged(PathBuf),
    /// Recursive scanning was switched on or off.
    RecurseSubfoldersChanged(bool),
    /// "Require file extension" mode was switched on or off.
    UseFileExtensionChanged(bool),
    /// The configured note extension changed (without leading dot).
    FileExtensionChanged(String),
    MarkdownSyntaxHighlightingChanged(bool),
    ThemeChanged(Theme),
    SortingMethodChanged(SortingMethod),
    EditorColorSchemeChanged(String),
    FontSizeChanged(u32),
    ActivateRowOnSelectChanged(bool),
    /// Seconds between external-modification polls.
    ExternalCheckIntervalChanged(u64),
}

impl ConfigEvent {
    /// Topic name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NotesDirChanged(_) => "notes-dir-changed",
            Self::RecurseSubfoldersChanged(_) => "recurse-subfolders-changed",
            Self::UseFileExtensionChanged(_) => "use-file-extension-changed",
            Self::FileExtensionChanged(_) => "file-extension-changed",
            Self::MarkdownSyntaxHighlightingChanged(_) => "markdown-syntax-highlighting-changed",
            Self::ThemeChanged(_) => "theme-changed",
            Self::SortingMethodChanged(_) => "sorting-method-changed",
            Self::EditorColorSchemeChanged(_) => "editor-color-scheme-changed",
            Self::FontSizeChanged(_) => "font-size-changed",
            Self::ActivateRowOnSelectChanged(_) => "activate-row-on-select-changed",
            Self::ExternalCheckIntervalChanged(_) => "external-check-interval-changed",
        }
    }

    /// Whether the note collection has to be rebuilt in response.
    pub fn requires_rescan(&self) -> bool {
        matches!(
            self,
            Self::NotesDirChanged(_)
                | Self::RecurseSubfoldersChanged(_)
                | Self::UseFileExtensionChanged(_)
                | Self::FileExtensionChanged(_)
        )
    }
}

/// A property of a [`Note`](crate::note::Note) that changed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteField {
    Name,
    Path,
    LastModified,
}

/// Events emitted by the note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// A save or check found the file newer on disk than the last known good write.
    NoteExternallyChanged {
        /// Path of the modified note.
        path: PathBuf,
    },

    /// The whole collection was rebuilt by a scan.
    NotesReloaded {
        /// Number of notes loaded.
        count: usize,
    },

    /// A note was created and appended to the collection.
    NoteCreated { path: PathBuf },

    /// A note was deleted from disk and removed from the collection.
    NoteDeleted { path: PathBuf },

    /// A note was renamed on disk.
    NoteRenamed { old_path: PathBuf, new_path: PathBuf },

    /// Properties of a tracked note changed. `path` is the current path.
    NoteUpdated { path: PathBuf, fields: Vec<NoteField> },

    /// The currently open note changed (`None` = closed).
    OpenNoteChanged { path: Option<PathBuf> },
}

impl StoreEvent {
    /// Get the primary path associated with this event.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::NoteExternallyChanged { path } => Some(path),
            Self::NotesReloaded { .. } => None,
            Self::NoteCreated { path } => Some(path),
            Self::NoteDeleted { path } => Some(path),
            Self::NoteRenamed { new_path, .. } => Some(new_path),
            Self::NoteUpdated { path, .. } => Some(path),
            Self::OpenNoteChanged { path } => path.as_ref(),
        }
    }

    /// Topic name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NoteExternallyChanged { .. } => "note-externally-changed",
            Self::NotesReloaded { .. } => "notes-reloaded",
            Self::NoteCreated { .. } => "note-created",
            Self::NoteDeleted { .. } => "note-deleted",
            Self::NoteRenamed { .. } => "note-renamed",
            Self::NoteUpdated { .. } => "note-updated",
            Self::OpenNoteChanged { .. } => "open-note-changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_event_topics() {
        let path = PathBuf::from("/notes/a.md");
        let event = StoreEvent::NoteExternallyChanged { path: path.clone() };
        assert_eq!(event.event_type(), "note-externally-changed");
        assert_eq!(event.path(), Some(&path));

        let event = StoreEvent::NotesReloaded { count: 4 };
        assert_eq!(event.event_type(), "notes-reloaded");
        assert!(event.path().is_none());

        let event = StoreEvent::NoteRenamed {
            old_path: PathBuf::from("/notes/a.md"),
            new_path: PathBuf::from("/notes/b.md"),
        };
        assert_eq!(event.path(), Some(&PathBuf::from("/notes/b.md")));
    }

    #[test]
    fn test_event_serialization() {
        let event = StoreEvent::NoteUpdated {
            path: PathBuf::from("/notes/a.md"),
            fields: vec![NoteField::Name, NoteField::LastModified],
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("NoteUpdated"));
        assert!(json.contains("last_modified"));

        let parsed: StoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);

        let json = serde_json::to_string(&ConfigEvent::FontSizeChanged(14)).unwrap();
        assert_eq!(json, r#"{"type":"FontSizeChanged","value":14}"#);
    }

    #[test]
    fn test_rescan_triggers() {
        assert!(ConfigEvent::NotesDirChanged(PathBuf::from("/x")).requires_rescan());
        assert!(ConfigEvent::UseFileExtensionChanged(true).requires_rescan());
        assert!(ConfigEvent::RecurseSubfoldersChanged(false).requires_rescan());
        assert!(!ConfigEvent::FontSizeChanged(10).requires_rescan());
        assert!(!ConfigEvent::ThemeChanged(Theme::Dark).requires_rescan());
    }
}
