//! Periodic external-modification check.
//!
//! A lightweight stand-in for filesystem watching: the host loop calls
//! [`ExternalChangePoller::tick`] whenever convenient and the poller decides
//! whether the interval has elapsed.

use std::time::{Duration, Instant};

use crate::fs::FileSystem;
use crate::store::NoteStore;

#[derive(Debug, Clone)]
pub struct ExternalChangePoller {
    interval: Duration,
    last_check: Option<Instant>,
}

impl ExternalChangePoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// True if no check has run yet or the interval has elapsed since the last one.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_check
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Check the open note if a check is due.
    ///
    /// Returns `None` when nothing was checked (not due, or no open note),
    /// otherwise whether the open note was modified externally.
    pub fn tick<FS: FileSystem>(&mut self, store: &mut NoteStore<FS>, now: Instant) -> Option<bool> {
        if !self.is_due(now) {
            return None;
        }
        self.last_check = Some(now);

        let path = store.currently_open_path()?.to_path_buf();
        Some(store.check_external_modification(&path))
    }
}

impl Default for ExternalChangePoller {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
