#![doc = include_str!("../README.md")]

/// Composition root (config + store + poller)
pub mod app;

/// Configuration store and schema
pub mod config;

/// Error (common error types)
pub mod error;

/// Typed notifications and the callback registry
pub mod events;

/// Filesystem abstraction
pub mod fs;

/// Note entity
pub mod note;

/// Periodic external-modification check
pub mod poller;

/// Note directory scanner
pub mod scanner;

/// Note store (load / save / detect protocol)
pub mod store;

pub use app::NotyApp;
pub use config::{ConfigKey, ConfigStore, SortingMethod, Theme, WindowSize};
pub use error::{ConfigError, NotyError, Result};
pub use events::{ConfigEvent, NoteField, StoreEvent};
pub use note::Note;
pub use scanner::{ExtensionPolicy, ScanOptions, ScanReport, ScanStats};
pub use store::{NoteStore, ReloadTrigger, SaveOutcome};
