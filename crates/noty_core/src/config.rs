//! Configuration store for Noty.
//!
//! This module provides the [`ConfigStore`], which owns the user's preferences
//! as a flat JSON document (typically at `~/.config/noty/config.json` on Unix
//! systems) and publishes a [`ConfigEvent`] whenever a setting changes.
//!
//! # Schema
//!
//! Every recognised key is a [`ConfigKey`] with a default. After
//! [`ConfigStore::load`] every schema key is present in the document: missing
//! keys are back-filled, and the legacy `dark_mode` flag is translated into the
//! three-way `theme` setting. Unknown keys are kept as they are.
//!
//! # Mutation and durability
//!
//! [`ConfigStore::set`] only changes the in-memory document. Callers decide
//! when to flush with [`ConfigStore::persist`].
//!
//! # Example
//!
//! ```ignore
//! use noty_core::config::{ConfigKey, ConfigStore};
//! use noty_core::fs::RealFileSystem;
//!
//! let mut config = ConfigStore::load(RealFileSystem, ConfigStore::<RealFileSystem>::default_path()?)?;
//! config.set(ConfigKey::RecurseSubfolders, true)?;
//! config.persist()?;
//! ```

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::error::{ConfigError, NotyError, Result};
use crate::events::{CallbackRegistry, ConfigEvent, EventCallback, SubscriptionId};
use crate::fs::FileSystem;
use crate::scanner::{ExtensionPolicy, ScanOptions};

/// Key of the boolean dark-mode flag written by old versions.
pub const LEGACY_DARK_MODE_KEY: &str = "dark_mode";

/// Application colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the desktop preference
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which the note list is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortingMethod {
    /// Case-insensitive by display name
    #[default]
    Name,
    /// Most recently modified first
    DateModified,
}

impl SortingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SortingMethod::Name => "name",
            SortingMethod::DateModified => "date_modified",
        }
    }
}

impl fmt::Display for SortingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last window geometry, written at quit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 350,
            height: 650,
        }
    }
}

/// Recognised configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    WindowSize,
    NotesDir,
    ShowMarkdownSyntaxHighlighting,
    Theme,
    SortingMethod,
    ActivateRowOnSelect,
    UseFileExtension,
    FileExtension,
    EditorColorScheme,
    RecurseSubfolders,
    FontSize,
    LastOpenedFile,
    ExternalCheckInterval,
}

impl ConfigKey {
    /// Every key of the schema, in document order.
    pub const ALL: [ConfigKey; 13] = [
        ConfigKey::WindowSize,
        ConfigKey::NotesDir,
        ConfigKey::ShowMarkdownSyntaxHighlighting,
        ConfigKey::Theme,
        ConfigKey::SortingMethod,
        ConfigKey::ActivateRowOnSelect,
        ConfigKey::UseFileExtension,
        ConfigKey::FileExtension,
        ConfigKey::EditorColorScheme,
        ConfigKey::RecurseSubfolders,
        ConfigKey::FontSize,
        ConfigKey::LastOpenedFile,
        ConfigKey::ExternalCheckInterval,
    ];

    /// Name of the key in the JSON document.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::WindowSize => "windowsize",
            ConfigKey::NotesDir => "notes_dir",
            ConfigKey::ShowMarkdownSyntaxHighlighting => "show_markdown_syntax_highlighting",
            ConfigKey::Theme => "theme",
            ConfigKey::SortingMethod => "sorting_method",
            ConfigKey::ActivateRowOnSelect => "activate_row_on_select",
            ConfigKey::UseFileExtension => "use_file_extension",
            ConfigKey::FileExtension => "file_extension",
            ConfigKey::EditorColorScheme => "editor_color_scheme",
            ConfigKey::RecurseSubfolders => "recurse_subfolders",
            ConfigKey::FontSize => "font_size",
            ConfigKey::LastOpenedFile => "last_opened_file",
            ConfigKey::ExternalCheckInterval => "external_check_interval_secs",
        }
    }

    /// Value used when the document does not carry the key.
    pub fn default_value(self) -> Value {
        match self {
            ConfigKey::WindowSize => json!(WindowSize::default()),
            ConfigKey::NotesDir => json!(default_notes_dir()),
            ConfigKey::ShowMarkdownSyntaxHighlighting => json!(false),
            ConfigKey::Theme => json!(Theme::default()),
            ConfigKey::SortingMethod => json!(SortingMethod::default()),
            ConfigKey::ActivateRowOnSelect => json!(false),
            ConfigKey::UseFileExtension => json!(false),
            ConfigKey::FileExtension => json!("md"),
            ConfigKey::EditorColorScheme => json!("default"),
            ConfigKey::RecurseSubfolders => json!(false),
            ConfigKey::FontSize => json!(12),
            ConfigKey::LastOpenedFile => Value::Null,
            ConfigKey::ExternalCheckInterval => json!(5),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            ConfigKey::WindowSize => "an object with integer width and height",
            ConfigKey::NotesDir => "a non-empty path",
            ConfigKey::Theme => "one of light, dark, system",
            ConfigKey::SortingMethod => "one of name, date_modified",
            ConfigKey::FileExtension => "an extension without path separators",
            ConfigKey::EditorColorScheme => "a string",
            ConfigKey::FontSize => "an integer between 1 and 200",
            ConfigKey::LastOpenedFile => "a path or null",
            ConfigKey::ExternalCheckInterval => "a positive number of seconds",
            ConfigKey::ShowMarkdownSyntaxHighlighting
            | ConfigKey::ActivateRowOnSelect
            | ConfigKey::UseFileExtension
            | ConfigKey::RecurseSubfolders => "a boolean",
        }
    }

    /// Check that `value` has the shape this key stores.
    pub fn validate(self, value: &Value) -> std::result::Result<(), ConfigError> {
        let valid = match self {
            ConfigKey::WindowSize => decodes::<WindowSize>(value),
            ConfigKey::NotesDir => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            ConfigKey::Theme => decodes::<Theme>(value),
            ConfigKey::SortingMethod => decodes::<SortingMethod>(value),
            ConfigKey::FileExtension => value.as_str().is_some_and(|s| {
                let ext = s.trim_start_matches('.');
                !ext.is_empty() && !ext.contains(['/', '\\'])
            }),
            ConfigKey::EditorColorScheme => value.is_string(),
            ConfigKey::FontSize => value.as_u64().is_some_and(|n| (1..=200).contains(&n)),
            ConfigKey::LastOpenedFile => value.is_string() || value.is_null(),
            ConfigKey::ExternalCheckInterval => value.as_u64().is_some_and(|n| n > 0),
            ConfigKey::ShowMarkdownSyntaxHighlighting
            | ConfigKey::ActivateRowOnSelect
            | ConfigKey::UseFileExtension
            | ConfigKey::RecurseSubfolders => value.is_boolean(),
        };

        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: self.as_str(),
                expected: self.expected(),
                value: value.clone(),
            })
        }
    }

    /// Notification published when this key takes `value`, if the key has a topic.
    fn event_for(self, value: &Value) -> Option<ConfigEvent> {
        match self {
            ConfigKey::NotesDir => decode(value).map(ConfigEvent::NotesDirChanged),
            ConfigKey::RecurseSubfolders => decode(value).map(ConfigEvent::RecurseSubfoldersChanged),
            ConfigKey::UseFileExtension => decode(value).map(ConfigEvent::UseFileExtensionChanged),
            ConfigKey::FileExtension => decode(value).map(ConfigEvent::FileExtensionChanged),
            ConfigKey::ShowMarkdownSyntaxHighlighting => {
                decode(value).map(ConfigEvent::MarkdownSyntaxHighlightingChanged)
            }
            ConfigKey::Theme => decode(value).map(ConfigEvent::ThemeChanged),
            ConfigKey::SortingMethod => decode(value).map(ConfigEvent::SortingMethodChanged),
            ConfigKey::EditorColorScheme => decode(value).map(ConfigEvent::EditorColorSchemeChanged),
            ConfigKey::FontSize => decode(value).map(ConfigEvent::FontSizeChanged),
            ConfigKey::ActivateRowOnSelect => {
                decode(value).map(ConfigEvent::ActivateRowOnSelectChanged)
            }
            ConfigKey::ExternalCheckInterval => {
                decode(value).map(ConfigEvent::ExternalCheckIntervalChanged)
            }
            // batched at quit / bookkeeping only
            ConfigKey::WindowSize | ConfigKey::LastOpenedFile => None,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

fn decodes<T: DeserializeOwned>(value: &Value) -> bool {
    decode::<T>(value).is_some()
}

/// Truthiness of a JSON value, used for the legacy flag migration.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Default notes directory (`~/Documents/Notes`).
#[cfg(not(target_arch = "wasm32"))]
pub fn default_notes_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Notes")
}

/// Default notes directory (virtual root on WASM).
#[cfg(target_arch = "wasm32")]
pub fn default_notes_dir() -> PathBuf {
    PathBuf::from("/notes")
}

/// The user's preferences, backed by one JSON document.
pub struct ConfigStore<FS: FileSystem> {
    fs: FS,
    path: PathBuf,
    document: IndexMap<String, Value>,
    events: CallbackRegistry<ConfigEvent>,
}

impl<FS: FileSystem> ConfigStore<FS> {
    /// Load the document at `path`, creating it from defaults if it is missing
    /// or unreadable as JSON.
    ///
    /// Runs the legacy migration and back-fills missing keys; when either
    /// changed the document it is written back immediately.
    pub fn load(fs: FS, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let (mut document, mut dirty) = if fs.is_file(&path) {
            let contents = fs
                .read_to_string(&path)
                .map_err(|source| NotyError::FileRead {
                    path: path.clone(),
                    source,
                })?;
            match serde_json::from_str::<IndexMap<String, Value>>(&contents) {
                Ok(document) => (document, false),
                Err(e) => {
                    warn!("Discarding unreadable config {:?}: {}", path, e);
                    (IndexMap::new(), true)
                }
            }
        } else {
            info!("No config at {:?}, writing defaults", path);
            (IndexMap::new(), true)
        };

        dirty |= migrate_legacy(&mut document);
        dirty |= backfill(&mut document);

        let store = Self {
            fs,
            path,
            document,
            events: CallbackRegistry::new(),
        };

        if dirty && let Err(e) = store.persist() {
            warn!("Could not write config {:?}: {}", store.path, e);
        }

        Ok(store)
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored value for `key`, or its default when the document lacks it.
    pub fn get(&self, key: ConfigKey) -> Value {
        self.document
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }

    /// All entries of the document, unknown keys included, in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.document.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Change a setting in memory.
    ///
    /// Returns `Ok(true)` when the stored value changed, in which case the
    /// matching [`ConfigEvent`] (if the key has one) has been published.
    /// Nothing is written to disk; call [`persist`](Self::persist).
    pub fn set<V: Serialize>(&mut self, key: ConfigKey, value: V) -> Result<bool> {
        let value = serde_json::to_value(value).map_err(ConfigError::from)?;
        key.validate(&value)?;

        if self.document.get(key.as_str()) == Some(&value) {
            return Ok(false);
        }

        let event = key.event_for(&value);
        self.document.insert(key.as_str().to_string(), value);

        if let Some(event) = event {
            debug!("Config change: {}", event.event_type());
            self.events.emit(&event);
        }
        Ok(true)
    }

    /// Restore the default value of `key` (publishing its event if it changed).
    pub fn reset(&mut self, key: ConfigKey) -> Result<bool> {
        self.set(key, key.default_value())
    }

    /// Write the document to disk, creating the parent directory if needed.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.fs.create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.document).map_err(ConfigError::from)?;
        self.fs
            .write_file(&self.path, &contents)
            .map_err(|source| NotyError::FileWrite {
                path: self.path.clone(),
                source,
            })
    }

    /// Make sure the notes directory exists.
    ///
    /// When the configured directory cannot be created the setting falls back
    /// to [`default_notes_dir`], is persisted, and that directory is created.
    pub fn ensure_notes_dir(&mut self) -> Result<PathBuf> {
        let dir = self.notes_dir();
        if self.fs.is_dir(&dir) {
            return Ok(dir);
        }

        let Err(e) = self.fs.create_dir_all(&dir) else {
            info!("Created notes directory {:?}", dir);
            return Ok(dir);
        };

        let fallback = default_notes_dir();
        if fallback == dir {
            return Err(NotyError::FileWrite { path: dir, source: e });
        }

        warn!(
            "Cannot create notes directory {:?} ({}), falling back to {:?}",
            dir, e, fallback
        );
        self.set(ConfigKey::NotesDir, &fallback)?;
        self.persist()?;
        self.fs
            .create_dir_all(&fallback)
            .map_err(|source| NotyError::FileWrite {
                path: fallback.clone(),
                source,
            })?;
        Ok(fallback)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a callback for every published setting change.
    pub fn subscribe(&self, callback: EventCallback<ConfigEvent>) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Register a channel receiving every published setting change.
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<ConfigEvent>) {
        self.events.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    fn typed<T: DeserializeOwned + Default>(&self, key: ConfigKey) -> T {
        let value = self.get(key);
        let value = match key.validate(&value) {
            Ok(()) => value,
            Err(e) => {
                warn!("{}; using the default", e);
                key.default_value()
            }
        };
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn notes_dir(&self) -> PathBuf {
        let dir: PathBuf = self.typed(ConfigKey::NotesDir);
        if dir.as_os_str().is_empty() {
            default_notes_dir()
        } else {
            dir
        }
    }

    pub fn recurse_subfolders(&self) -> bool {
        self.typed(ConfigKey::RecurseSubfolders)
    }

    pub fn use_file_extension(&self) -> bool {
        self.typed(ConfigKey::UseFileExtension)
    }

    /// Configured note extension, without the leading dot.
    pub fn file_extension(&self) -> String {
        let ext: String = self.typed(ConfigKey::FileExtension);
        ext.trim_start_matches('.').to_string()
    }

    pub fn show_markdown_syntax_highlighting(&self) -> bool {
        self.typed(ConfigKey::ShowMarkdownSyntaxHighlighting)
    }

    pub fn activate_row_on_select(&self) -> bool {
        self.typed(ConfigKey::ActivateRowOnSelect)
    }

    pub fn theme(&self) -> Theme {
        self.typed(ConfigKey::Theme)
    }

    pub fn sorting_method(&self) -> SortingMethod {
        self.typed(ConfigKey::SortingMethod)
    }

    pub fn editor_color_scheme(&self) -> String {
        self.typed(ConfigKey::EditorColorScheme)
    }

    pub fn font_size(&self) -> u32 {
        self.typed(ConfigKey::FontSize)
    }

    pub fn window_size(&self) -> WindowSize {
        self.typed(ConfigKey::WindowSize)
    }

    pub fn last_opened_file(&self) -> Option<PathBuf> {
        self.typed(ConfigKey::LastOpenedFile)
    }

    pub fn external_check_interval(&self) -> Duration {
        Duration::from_secs(self.typed(ConfigKey::ExternalCheckInterval))
    }

    /// Snapshot of the settings that drive a directory scan.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            root: self.notes_dir(),
            recursive: self.recurse_subfolders(),
            policy: ExtensionPolicy::new(self.use_file_extension(), self.file_extension()),
        }
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl<FS: FileSystem> ConfigStore<FS> {
    /// Get the config file path (~/.config/noty/config.json)
    pub fn default_path() -> std::result::Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("noty").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }
}

impl<FS: FileSystem> fmt::Debug for ConfigStore<FS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("document", &self.document)
            .field("events", &self.events)
            .finish()
    }
}

/// Translate the old boolean `dark_mode` flag into `theme`.
fn migrate_legacy(document: &mut IndexMap<String, Value>) -> bool {
    if document.contains_key(ConfigKey::Theme.as_str()) {
        return false;
    }
    let Some(dark) = document.get(LEGACY_DARK_MODE_KEY) else {
        return false;
    };

    let theme = if is_truthy(dark) {
        Theme::Dark
    } else {
        Theme::Light
    };
    info!("Migrating legacy '{}' flag to theme '{}'", LEGACY_DARK_MODE_KEY, theme);
    document.insert(ConfigKey::Theme.as_str().to_string(), json!(theme));
    true
}

/// Insert the default of every schema key the document lacks.
fn backfill(document: &mut IndexMap<String, Value>) -> bool {
    let mut changed = false;
    for key in ConfigKey::ALL {
        if !document.contains_key(key.as_str()) {
            debug!("Back-filling config key '{}'", key);
            document.insert(key.as_str().to_string(), key.default_value());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CONFIG: &str = "/home/user/.config/noty/config.json";

    fn on_disk(fs: &InMemoryFileSystem) -> IndexMap<String, Value> {
        serde_json::from_str(&fs.get_content(CONFIG).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let fs = InMemoryFileSystem::new();
        let config = ConfigStore::load(fs.clone(), CONFIG).unwrap();

        assert_eq!(config.theme(), Theme::System);
        assert_eq!(config.font_size(), 12);
        assert_eq!(config.file_extension(), "md");
        assert!(!config.recurse_subfolders());

        let written = on_disk(&fs);
        for key in ConfigKey::ALL {
            assert!(written.contains_key(key.as_str()), "missing {}", key);
        }
    }

    #[test]
    fn test_missing_key_is_backfilled_and_rewritten() {
        let fs = InMemoryFileSystem::new().with_file(
            CONFIG,
            r#"{"notes_dir": "/home/user/notes", "theme": "dark", "font_size": 16}"#,
        );
        let config = ConfigStore::load(fs.clone(), CONFIG).unwrap();

        assert_eq!(config.notes_dir(), PathBuf::from("/home/user/notes"));
        assert_eq!(config.font_size(), 16);
        assert_eq!(config.get(ConfigKey::RecurseSubfolders), json!(false));
        assert_eq!(config.sorting_method(), SortingMethod::Name);

        let written = on_disk(&fs);
        assert_eq!(written.get("recurse_subfolders"), Some(&json!(false)));
        assert_eq!(written.get("font_size"), Some(&json!(16)));
        // existing keys keep their position
        assert_eq!(written.keys().next().map(String::as_str), Some("notes_dir"));
    }

    #[test]
    fn test_complete_document_is_not_rewritten() {
        let fs = InMemoryFileSystem::new();
        ConfigStore::load(fs.clone(), CONFIG).unwrap();
        let writes = fs.write_count();

        ConfigStore::load(fs.clone(), CONFIG).unwrap();
        assert_eq!(fs.write_count(), writes);
    }

    #[test]
    fn test_dark_mode_migration() {
        let fs = InMemoryFileSystem::new().with_file(CONFIG, r#"{"dark_mode": true}"#);
        let config = ConfigStore::load(fs.clone(), CONFIG).unwrap();

        assert_eq!(config.theme(), Theme::Dark);
        let written = on_disk(&fs);
        assert_eq!(written.get("theme"), Some(&json!("dark")));
        // the legacy key is left in place
        assert_eq!(written.get("dark_mode"), Some(&json!(true)));

        let fs = InMemoryFileSystem::new().with_file(CONFIG, r#"{"dark_mode": false}"#);
        let config = ConfigStore::load(fs, CONFIG).unwrap();
        assert_eq!(config.theme(), Theme::Light);
    }

    #[test]
    fn test_migration_skipped_when_theme_present() {
        let fs = InMemoryFileSystem::new()
            .with_file(CONFIG, r#"{"dark_mode": true, "theme": "light"}"#);
        let config = ConfigStore::load(fs, CONFIG).unwrap();
        assert_eq!(config.theme(), Theme::Light);
    }

    #[test]
    fn test_unreadable_document_falls_back_to_defaults() {
        let fs = InMemoryFileSystem::new().with_file(CONFIG, "{not json");
        let config = ConfigStore::load(fs.clone(), CONFIG).unwrap();
        assert_eq!(config.font_size(), 12);
        assert!(on_disk(&fs).contains_key("notes_dir"));

        let fs = InMemoryFileSystem::new().with_file(CONFIG, "[1, 2, 3]");
        let config = ConfigStore::load(fs, CONFIG).unwrap();
        assert_eq!(config.theme(), Theme::System);
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let fs = InMemoryFileSystem::new()
            .with_file(CONFIG, r#"{"plugin_state": {"enabled": true}}"#);
        let config = ConfigStore::load(fs.clone(), CONFIG).unwrap();
        config.persist().unwrap();
        assert_eq!(
            on_disk(&fs).get("plugin_state"),
            Some(&json!({"enabled": true}))
        );
        assert!(config.entries().any(|(k, _)| k == "plugin_state"));
    }

    #[test]
    fn test_wrong_shape_reads_as_default() {
        let fs = InMemoryFileSystem::new()
            .with_file(CONFIG, r#"{"font_size": "huge", "theme": "neon"}"#);
        let config = ConfigStore::load(fs, CONFIG).unwrap();
        assert_eq!(config.font_size(), 12);
        assert_eq!(config.theme(), Theme::System);
        // raw access still returns what is stored
        assert_eq!(config.get(ConfigKey::FontSize), json!("huge"));
    }

    #[test]
    fn test_set_validates_and_does_not_persist() {
        let fs = InMemoryFileSystem::new();
        let mut config = ConfigStore::load(fs.clone(), CONFIG).unwrap();

        let err = config.set(ConfigKey::FontSize, 0).unwrap_err();
        assert!(matches!(
            err,
            NotyError::Config(ConfigError::InvalidValue { key: "font_size", .. })
        ));
        assert!(config.set(ConfigKey::Theme, "sepia").is_err());
        assert!(config.set(ConfigKey::RecurseSubfolders, "yes").is_err());
        assert!(config.set(ConfigKey::FileExtension, "a/b").is_err());

        assert!(config.set(ConfigKey::FontSize, 18).unwrap());
        assert_eq!(config.font_size(), 18);
        assert_eq!(on_disk(&fs).get("font_size"), Some(&json!(12)));

        config.persist().unwrap();
        assert_eq!(on_disk(&fs).get("font_size"), Some(&json!(18)));
    }

    #[test]
    fn test_set_publishes_only_on_change() {
        let mut config = ConfigStore::load(InMemoryFileSystem::new(), CONFIG).unwrap();
        let (_id, rx) = config.subscribe_channel();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        config.subscribe(Arc::new(move |_: &ConfigEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(config.set(ConfigKey::RecurseSubfolders, true).unwrap());
        assert!(!config.set(ConfigKey::RecurseSubfolders, true).unwrap());
        assert!(config.set(ConfigKey::Theme, Theme::Dark).unwrap());
        assert!(config.set(ConfigKey::WindowSize, WindowSize { width: 800, height: 600 }).unwrap());

        let events: Vec<ConfigEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ConfigEvent::RecurseSubfoldersChanged(true),
                ConfigEvent::ThemeChanged(Theme::Dark),
            ]
        );
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut config = ConfigStore::load(InMemoryFileSystem::new(), CONFIG).unwrap();
        config.set(ConfigKey::SortingMethod, SortingMethod::DateModified).unwrap();
        assert_eq!(config.sorting_method(), SortingMethod::DateModified);
        assert!(config.reset(ConfigKey::SortingMethod).unwrap());
        assert_eq!(config.sorting_method(), SortingMethod::Name);
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("notes_dir".parse::<ConfigKey>().unwrap(), ConfigKey::NotesDir);
        assert_eq!(
            "external_check_interval_secs".parse::<ConfigKey>().unwrap(),
            ConfigKey::ExternalCheckInterval
        );
        assert!(matches!(
            "dark_mode".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_scan_options_snapshot() {
        let fs = InMemoryFileSystem::new().with_file(
            CONFIG,
            r#"{"notes_dir": "/n", "recurse_subfolders": true, "use_file_extension": true, "file_extension": ".txt"}"#,
        );
        let config = ConfigStore::load(fs, CONFIG).unwrap();
        let options = config.scan_options();
        assert_eq!(options.root, PathBuf::from("/n"));
        assert!(options.recursive);
        assert!(options.policy.require_extension);
        assert_eq!(options.policy.extension, "txt");
    }

    #[test]
    fn test_ensure_notes_dir_creates_directory() {
        let fs = InMemoryFileSystem::new()
            .with_file(CONFIG, r#"{"notes_dir": "/home/user/notes"}"#);
        let mut config = ConfigStore::load(fs.clone(), CONFIG).unwrap();
        let dir = config.ensure_notes_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/notes"));
        assert!(fs.is_dir(&dir));
    }

    #[test]
    fn test_ensure_notes_dir_falls_back_to_default() {
        // a regular file blocks the configured directory
        let fs = InMemoryFileSystem::new()
            .with_file("/blocked", "")
            .with_file(CONFIG, r#"{"notes_dir": "/blocked"}"#);
        let mut config = ConfigStore::load(fs.clone(), CONFIG).unwrap();
        let dir = config.ensure_notes_dir().unwrap();

        assert_eq!(dir, default_notes_dir());
        assert!(fs.is_dir(&dir));
        assert_eq!(config.notes_dir(), dir);
        assert_eq!(on_disk(&fs).get("notes_dir"), Some(&json!(dir)));
    }
}
