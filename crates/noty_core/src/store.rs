//! The note store.
//!
//! [`NoteStore`] owns the note collection, the currently open note and the
//! baseline used to detect external modification. Every operation is meant to
//! be called from a single event loop; there is no internal locking.
//!
//! # Save protocol
//!
//! [`NoteStore::save`] refuses to clobber a file that changed on disk since the
//! store last loaded or wrote it. The check compares the file's modification
//! time against the store's own last successful write (`last_save_time`). When
//! the disk copy is newer the save fails with
//! [`NotyError::ExternallyModified`] and a
//! [`StoreEvent::NoteExternallyChanged`] is published, at most once per path per
//! debounce window. The caller then either reloads (`load`) or overwrites
//! (`save` with `overwrite_external`).
//!
//! Timestamps are compared strictly, so an external write that lands within
//! the filesystem's timestamp granularity of our own write goes unnoticed.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant, SystemTime};

use crate::config::{ConfigStore, SortingMethod};
use crate::error::{NotyError, Result};
use crate::events::{
    CallbackRegistry, ConfigEvent, EventCallback, NoteField, StoreEvent, SubscriptionId,
};
use crate::fs::FileSystem;
use crate::note::Note;
use crate::scanner::{self, ScanOptions, ScanStats};

/// Default window during which repeated external-change notifications for the
/// same path are suppressed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// What a successful save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The content was written to disk.
    Written,
    /// The disk already held this content; nothing was written.
    Unchanged,
}

/// Why the collection is being rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    NotesDirChanged,
    ExtensionModeChanged,
    RecursionChanged,
    Explicit,
}

/// Owner of the note collection and the open-note session.
pub struct NoteStore<FS: FileSystem> {
    fs: FS,
    options: ScanOptions,
    notes: Vec<Note>,
    currently_open: Option<PathBuf>,
    last_save_time: Option<SystemTime>,
    debounce: Duration,
    last_notified: HashMap<PathBuf, Instant>,
    last_scan: ScanStats,
    events: CallbackRegistry<StoreEvent>,
    config_events: Option<(SubscriptionId, Receiver<ConfigEvent>)>,
}

impl<FS: FileSystem> NoteStore<FS> {
    /// Create an empty store. Call [`reload`](Self::reload) to populate it.
    pub fn new(fs: FS, options: ScanOptions) -> Self {
        Self {
            fs,
            options,
            notes: Vec::new(),
            currently_open: None,
            last_save_time: None,
            debounce: DEFAULT_DEBOUNCE,
            last_notified: HashMap::new(),
            last_scan: ScanStats::default(),
            events: CallbackRegistry::new(),
            config_events: None,
        }
    }

    /// Set the external-change notification debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Look a note up by exact path.
    pub fn find(&self, path: &Path) -> Option<&Note> {
        self.notes.iter().find(|n| n.matches_path(path))
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.notes.iter().position(|n| n.matches_path(path))
    }

    pub fn currently_open_path(&self) -> Option<&Path> {
        self.currently_open.as_deref()
    }

    pub fn currently_open_note(&self) -> Option<&Note> {
        self.currently_open_path().and_then(|p| self.find(p))
    }

    /// Baseline of the external-modification check.
    pub fn last_save_time(&self) -> Option<DateTime<Utc>> {
        self.last_save_time.map(DateTime::<Utc>::from)
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Counters of the most recent scan.
    pub fn last_scan(&self) -> ScanStats {
        self.last_scan
    }

    pub fn fs(&self) -> &FS {
        &self.fs
    }

    /// Notes in presentation order.
    pub fn sorted(&self, method: SortingMethod) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        match method {
            SortingMethod::Name => notes.sort_by_cached_key(|n| n.name().to_lowercase()),
            SortingMethod::DateModified => {
                notes.sort_by(|a, b| b.last_modified().cmp(&a.last_modified()))
            }
        }
        notes
    }

    /// Notes whose name contains `query`, ignoring case. An empty query matches
    /// everything.
    pub fn filter(&self, query: &str) -> Vec<&Note> {
        let query = query.trim().to_lowercase();
        self.notes
            .iter()
            .filter(|n| query.is_empty() || n.name().to_lowercase().contains(&query))
            .collect()
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe(&self, callback: EventCallback<StoreEvent>) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<StoreEvent>) {
        self.events.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&self, event: StoreEvent) {
        debug!("Store event: {}", event.event_type());
        self.events.emit(&event);
    }

    // ========================================================================
    // Open note session
    // ========================================================================

    fn is_open(&self, path: &Path) -> bool {
        self.currently_open
            .as_deref()
            .is_some_and(|open| open.as_os_str() == path.as_os_str())
    }

    fn set_open(&mut self, path: Option<PathBuf>) {
        if self.currently_open == path {
            return;
        }
        self.currently_open = path.clone();
        self.emit(StoreEvent::OpenNoteChanged { path });
    }

    fn close(&mut self) {
        self.last_save_time = None;
        self.set_open(None);
    }

    /// Open `path` and return its content.
    ///
    /// The previously open note is not saved. On any failure (including a
    /// missing file) the store ends up with no open note and the content is
    /// empty. `None` closes the open note.
    pub fn load(&mut self, path: Option<&Path>) -> String {
        let Some(path) = path else {
            self.close();
            return String::new();
        };

        match self.fs.read_to_string(path) {
            Ok(content) => {
                self.last_save_time = match self.fs.modified_time(path) {
                    Ok(time) => Some(time),
                    Err(e) => {
                        warn!("Cannot read modification time of {:?}: {}", path, e);
                        None
                    }
                };
                self.set_open(Some(path.to_path_buf()));
                content
            }
            Err(e) => {
                warn!("Failed to load {:?}: {}", path, e);
                self.close();
                String::new()
            }
        }
    }

    // ========================================================================
    // Save protocol
    // ========================================================================

    /// Whether the file on disk is newer than the open note's baseline.
    fn externally_modified(&self, path: &Path) -> bool {
        let Some(baseline) = self.last_save_time else {
            return false;
        };
        if !self.is_open(path) {
            return false;
        }
        match self.fs.modified_time(path) {
            Ok(modified) => modified > baseline,
            Err(_) => false,
        }
    }

    /// Publish `NoteExternallyChanged` unless one went out for `path` within the
    /// debounce window.
    fn notify_external_change(&mut self, path: &Path) {
        let now = Instant::now();
        if let Some(last) = self.last_notified.get(path)
            && now.duration_since(*last) < self.debounce
        {
            debug!("Debounced external-change notification for {:?}", path);
            return;
        }
        self.last_notified.insert(path.to_path_buf(), now);
        self.emit(StoreEvent::NoteExternallyChanged {
            path: path.to_path_buf(),
        });
    }

    /// Write `content` to `path`.
    ///
    /// Fails with [`NotyError::NotFound`] when the file is gone and with
    /// [`NotyError::ExternallyModified`] when it changed on disk since the
    /// baseline (unless `overwrite_external`). Identical content is not
    /// rewritten. On a write error the baseline is left unchanged.
    pub fn save(&mut self, path: &Path, content: &str, overwrite_external: bool) -> Result<SaveOutcome> {
        if !self.fs.is_file(path) {
            warn!("Cannot save {:?}: file no longer exists", path);
            return Err(NotyError::NotFound(path.to_path_buf()));
        }

        if !overwrite_external && self.externally_modified(path) {
            warn!("Refusing to save {:?}: modified externally", path);
            self.notify_external_change(path);
            return Err(NotyError::ExternallyModified(path.to_path_buf()));
        }

        if let Ok(existing) = self.fs.read_to_string(path)
            && existing == content
        {
            debug!("Content of {:?} unchanged, skipping write", path);
            self.rebaseline(path);
            return Ok(SaveOutcome::Unchanged);
        }

        if let Err(source) = self.fs.write_file(path, content) {
            error!("Failed to write {:?}: {}", path, source);
            return Err(NotyError::FileWrite {
                path: path.to_path_buf(),
                source,
            });
        }
        self.rebaseline(path);
        self.refresh_note(path);
        Ok(SaveOutcome::Written)
    }

    /// Save the open note.
    pub fn save_current(&mut self, content: &str, overwrite_external: bool) -> Result<SaveOutcome> {
        let path = self.currently_open.clone().ok_or(NotyError::NoOpenNote)?;
        self.save(&path, content, overwrite_external)
    }

    fn rebaseline(&mut self, path: &Path) {
        if self.is_open(path) {
            self.last_save_time = Some(SystemTime::now());
        }
    }

    fn refresh_note(&mut self, path: &Path) {
        let Some(idx) = self.position(path) else {
            return;
        };
        match self.notes[idx].refresh_timestamp(&self.fs) {
            Ok(true) => self.emit(StoreEvent::NoteUpdated {
                path: path.to_path_buf(),
                fields: vec![NoteField::LastModified],
            }),
            Ok(false) => {}
            Err(e) => warn!("Cannot refresh timestamp of {:?}: {}", path, e),
        }
    }

    /// Query form of the save-time check, for focus changes and polling.
    ///
    /// Only the open note has a baseline; any other path reports `false`.
    pub fn check_external_modification(&mut self, path: &Path) -> bool {
        if !self.externally_modified(path) {
            return false;
        }
        info!("{:?} was modified externally", path);
        self.notify_external_change(path);
        true
    }

    // ========================================================================
    // Collection management
    // ========================================================================

    /// Create an empty note called `name` in the notes root.
    pub fn create(&mut self, name: &str) -> Result<&Note> {
        validate_name(name)?;
        let path = self.options.root.join(self.options.policy.file_name_for(name));

        if self.fs.exists(&path) {
            return Err(NotyError::AlreadyExists(path));
        }

        self.fs
            .create_dir_all(&self.options.root)
            .map_err(|source| NotyError::FileWrite {
                path: self.options.root.clone(),
                source,
            })?;

        if let Err(source) = self.fs.create_new(&path, "") {
            if source.kind() == ErrorKind::AlreadyExists {
                return Err(NotyError::AlreadyExists(path));
            }
            error!("Failed to create {:?}: {}", path, source);
            return Err(NotyError::FileWrite { path, source });
        }

        let note = match Note::create(&self.fs, &path) {
            Ok(note) => note,
            Err(e) => {
                error!("Created {:?} but cannot stat it: {}", path, e);
                if let Err(cleanup) = self.fs.delete_file(&path) {
                    warn!("Failed to remove {:?}: {}", path, cleanup);
                }
                return Err(e);
            }
        };
        self.notes.retain(|n| !n.matches_path(&path));
        self.notes.push(note);
        info!("Created note {:?}", path);
        self.emit(StoreEvent::NoteCreated { path });

        let idx = self.notes.len() - 1;
        Ok(&self.notes[idx])
    }

    /// Delete the note at `path` from disk and from the collection.
    pub fn delete(&mut self, path: &Path) -> Result<()> {
        let idx = self
            .position(path)
            .ok_or_else(|| NotyError::NotFound(path.to_path_buf()))?;

        if let Err(source) = self.fs.delete_file(path) {
            error!("Failed to delete {:?}: {}", path, source);
            return Err(NotyError::FileDelete {
                path: path.to_path_buf(),
                source,
            });
        }

        self.notes.remove(idx);
        self.last_notified.remove(path);
        if self.is_open(path) {
            self.close();
        }
        info!("Deleted note {:?}", path);
        self.emit(StoreEvent::NoteDeleted {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Rename the note at `path` to `new_name`, keeping it in its directory.
    pub fn rename(&mut self, path: &Path, new_name: &str) -> Result<&Note> {
        validate_name(new_name)?;
        let idx = self
            .position(path)
            .ok_or_else(|| NotyError::NotFound(path.to_path_buf()))?;

        let file_name = self.options.policy.file_name_for(new_name);
        let new_path = match path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        };

        if new_path.as_os_str() == path.as_os_str() {
            return Ok(&self.notes[idx]);
        }
        if self.fs.exists(&new_path) {
            return Err(NotyError::AlreadyExists(new_path));
        }

        if let Err(source) = self.fs.move_file(path, &new_path) {
            error!("Failed to rename {:?} to {:?}: {}", path, new_path, source);
            return Err(NotyError::FileRename {
                from: path.to_path_buf(),
                to: new_path,
                source,
            });
        }

        let fields = match self.notes[idx].apply_rename(&self.fs, &new_path) {
            Ok(fields) => fields,
            Err(e) => {
                // the file has moved but cannot be tracked under its new path
                error!("Renamed {:?} to {:?} but cannot stat it: {}", path, new_path, e);
                self.notes.remove(idx);
                self.last_notified.remove(path);
                if self.is_open(path) {
                    self.close();
                }
                self.emit(StoreEvent::NoteDeleted {
                    path: path.to_path_buf(),
                });
                return Err(e);
            }
        };
        self.last_notified.remove(path);

        if self.is_open(path) {
            self.last_save_time = self.fs.modified_time(&new_path).ok();
            self.set_open(Some(new_path.clone()));
        }

        info!("Renamed {:?} to {:?}", path, new_path);
        self.emit(StoreEvent::NoteRenamed {
            old_path: path.to_path_buf(),
            new_path: new_path.clone(),
        });
        self.emit(StoreEvent::NoteUpdated {
            path: new_path,
            fields,
        });
        Ok(&self.notes[idx])
    }

    /// Rebuild the collection from a fresh scan. Returns the number of notes
    /// loaded.
    pub fn reload(&mut self, trigger: ReloadTrigger) -> usize {
        let report = scanner::scan(&self.fs, &self.options);
        if report.failed > 0 {
            warn!(
                "{} of {} notes in {:?} could not be loaded",
                report.failed, report.candidates, self.options.root
            );
        }

        let count = report.loaded();
        self.last_scan = report.stats();
        self.notes = report.notes;
        info!(
            "Reloaded {} notes from {:?} ({:?})",
            count, self.options.root, trigger
        );
        self.emit(StoreEvent::NotesReloaded { count });
        count
    }

    // ========================================================================
    // Configuration bus
    // ========================================================================

    /// Subscribe to the configuration store's change events. Events are
    /// applied by [`process_config_events`](Self::process_config_events).
    pub fn attach_config<C: FileSystem>(&mut self, config: &ConfigStore<C>) -> SubscriptionId {
        let (id, rx) = config.subscribe_channel();
        self.config_events = Some((id, rx));
        id
    }

    /// Apply every pending configuration event, rescanning at most once.
    ///
    /// Returns `true` if the collection was reloaded.
    pub fn process_config_events(&mut self) -> bool {
        let pending: Vec<ConfigEvent> = match &self.config_events {
            Some((_, rx)) => rx.try_iter().collect(),
            None => return false,
        };

        let trigger = pending
            .iter()
            .filter_map(|event| self.apply_config_event(event))
            .reduce(|first, next| {
                if next == ReloadTrigger::NotesDirChanged {
                    next
                } else {
                    first
                }
            });

        match trigger {
            Some(trigger) => {
                self.reload(trigger);
                true
            }
            None => false,
        }
    }

    /// Apply one configuration event, rescanning if it affects the collection.
    pub fn handle_config_event(&mut self, event: &ConfigEvent) -> bool {
        match self.apply_config_event(event) {
            Some(trigger) => {
                self.reload(trigger);
                true
            }
            None => false,
        }
    }

    fn apply_config_event(&mut self, event: &ConfigEvent) -> Option<ReloadTrigger> {
        if !event.requires_rescan() {
            return None;
        }
        match event {
            ConfigEvent::NotesDirChanged(root) => {
                self.options.root = root.clone();
                self.close();
                self.last_notified.clear();
                Some(ReloadTrigger::NotesDirChanged)
            }
            ConfigEvent::RecurseSubfoldersChanged(recursive) => {
                self.options.recursive = *recursive;
                Some(ReloadTrigger::RecursionChanged)
            }
            ConfigEvent::UseFileExtensionChanged(required) => {
                self.options.policy.require_extension = *required;
                Some(ReloadTrigger::ExtensionModeChanged)
            }
            ConfigEvent::FileExtensionChanged(extension) => {
                self.options.policy.extension = extension.trim_start_matches('.').to_string();
                Some(ReloadTrigger::ExtensionModeChanged)
            }
            _ => None,
        }
    }
}

impl<FS: FileSystem> std::fmt::Debug for NoteStore<FS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("options", &self.options)
            .field("notes", &self.notes.len())
            .field("currently_open", &self.currently_open)
            .field("last_save_time", &self.last_save_time)
            .field("debounce", &self.debounce)
            .finish()
    }
}

/// Reject names that would escape the directory or produce a hidden file.
fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(NotyError::InvalidName(name.to_string()));
    }
    Ok(())
}
