//! Composition root.
//!
//! [`NotyApp`] builds the configuration store and the note store once and
//! wires the store to the configuration bus. Front ends hold one `NotyApp`
//! and route every call through it.

use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ConfigKey, ConfigStore, WindowSize};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::poller::ExternalChangePoller;
use crate::store::{NoteStore, ReloadTrigger, SaveOutcome};

/// Configuration store, note store and poller, built together.
#[derive(Debug)]
pub struct NotyApp<FS: FileSystem + Clone> {
    config: ConfigStore<FS>,
    store: NoteStore<FS>,
    poller: ExternalChangePoller,
}

impl<FS: FileSystem + Clone> NotyApp<FS> {
    /// Load the configuration at `config_path`, make sure the notes directory
    /// exists and perform the initial scan.
    pub fn new(fs: FS, config_path: impl Into<PathBuf>) -> Result<Self> {
        let mut config = ConfigStore::load(fs.clone(), config_path)?;
        if let Err(e) = config.ensure_notes_dir() {
            warn!("Notes directory unavailable: {}", e);
        }

        let mut store = NoteStore::new(fs, config.scan_options());
        store.attach_config(&config);
        store.reload(ReloadTrigger::Explicit);

        let poller = ExternalChangePoller::new(config.external_check_interval());
        info!(
            "Loaded {} notes from {:?}",
            store.len(),
            store.options().root
        );

        Ok(Self {
            config,
            store,
            poller,
        })
    }

    pub fn config(&self) -> &ConfigStore<FS> {
        &self.config
    }

    pub fn store(&self) -> &NoteStore<FS> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore<FS> {
        &mut self.store
    }

    /// Change a setting, persist it and let the note store react.
    pub fn update_setting<V: Serialize>(&mut self, key: ConfigKey, value: V) -> Result<bool> {
        let changed = self.config.set(key, value)?;
        if changed {
            self.config.persist()?;
        }
        self.store.process_config_events();
        if key == ConfigKey::ExternalCheckInterval {
            self.poller.set_interval(self.config.external_check_interval());
        }
        Ok(changed)
    }

    /// Reset a setting to its default, persist it and let the note store react.
    pub fn reset_setting(&mut self, key: ConfigKey) -> Result<bool> {
        self.update_setting(key, key.default_value())
    }

    /// Open a note and remember it as the last opened file.
    pub fn open_note(&mut self, path: &Path) -> String {
        let content = self.store.load(Some(path));
        if self.store.currently_open_path() == Some(path) {
            let remembered = self
                .config
                .set(ConfigKey::LastOpenedFile, path)
                .and_then(|changed| if changed { self.config.persist() } else { Ok(()) });
            if let Err(e) = remembered {
                warn!("Could not remember last opened file: {}", e);
            }
        }
        content
    }

    /// Reopen the note that was open at the end of the last session, if it is
    /// still part of the collection.
    pub fn reopen_last(&mut self) -> Option<String> {
        let path = self.config.last_opened_file()?;
        if self.store.find(&path).is_none() {
            info!("Last opened file {:?} is gone", path);
            return None;
        }
        Some(self.open_note(&path))
    }

    /// Apply pending setting changes and run the periodic external check.
    pub fn tick(&mut self, now: Instant) -> Option<bool> {
        self.store.process_config_events();
        self.poller.tick(&mut self.store, now)
    }

    /// Save the forwarded editor buffer and persist the settings batched for
    /// quit time.
    ///
    /// The settings are persisted even when the save fails; the save error is
    /// returned afterwards.
    pub fn shutdown(
        &mut self,
        window_size: Option<WindowSize>,
        pending_content: Option<&str>,
    ) -> Result<Option<SaveOutcome>> {
        let saved = match pending_content {
            Some(content) if self.store.currently_open_path().is_some() => {
                self.store.save_current(content, false).map(Some)
            }
            _ => Ok(None),
        };

        if let Some(size) = window_size {
            self.config.set(ConfigKey::WindowSize, size)?;
        }
        self.config.persist()?;
        saved
    }
}
