//! `watch` command: keep a note open and report outside edits.
//!
//! Runs until the note disappears or the process is interrupted. When another
//! program changes the file the new content is reloaded, which is the
//! "reload" answer to an external-change notification.

use std::thread;
use std::time::{Duration, Instant};

use noty_core::StoreEvent;
use noty_core::fs::FileSystem;
use noty_core::poller::ExternalChangePoller;

use crate::cli::CliApp;
use crate::cli::util::resolve_note;

const IDLE: Duration = Duration::from_millis(200);

pub fn handle_watch(app: &mut CliApp, arg: &str, interval: Option<u64>) -> bool {
    let path = match resolve_note(app.store(), arg) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let interval = match interval {
        Some(0) => {
            eprintln!("✗ --interval must be at least 1 second");
            return false;
        }
        Some(secs) => Duration::from_secs(secs),
        None => app.config().external_check_interval(),
    };

    let content = app.open_note(&path);
    if app.store().currently_open_path().is_none() {
        eprintln!("✗ Could not read {}", path.display());
        return false;
    }

    let (_id, events) = app.store().subscribe_channel();
    let mut poller = ExternalChangePoller::new(interval);
    // the first tick would fire immediately; start the clock now
    poller.tick(app.store_mut(), Instant::now());

    println!(
        "Watching {} ({} bytes), checking every {}s. Ctrl-C to stop.",
        path.display(),
        content.len(),
        interval.as_secs()
    );

    loop {
        thread::sleep(IDLE);

        if !app.store().fs().is_file(&path) {
            println!("✗ {} was removed", path.display());
            return true;
        }

        poller.tick(app.store_mut(), Instant::now());

        let changed = events
            .try_iter()
            .any(|event| matches!(event, StoreEvent::NoteExternallyChanged { .. }));
        if changed {
            let content = app.open_note(&path);
            println!(
                "↻ {} changed on disk, reloaded ({} bytes)",
                path.display(),
                content.len()
            );
        }
    }
}
