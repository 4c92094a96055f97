//! Note command handlers

use chrono::Local;
use std::io::Read;
use std::path::PathBuf;

use noty_core::{NotyError, ReloadTrigger, SaveOutcome, SortingMethod};

use crate::cli::CliApp;
use crate::cli::util::{display_path, resolve_note};

fn resolve(app: &CliApp, arg: &str) -> Option<PathBuf> {
    match resolve_note(app.store(), arg) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("✗ {}", e);
            None
        }
    }
}

/// Handle the list command
/// Returns true on success, false on error
pub fn handle_list(
    app: &CliApp,
    sort: Option<SortingMethod>,
    filter: Option<&str>,
    json: bool,
) -> bool {
    let store = app.store();
    let method = sort.unwrap_or_else(|| app.config().sorting_method());
    let hits = store.filter(filter.unwrap_or_default());

    let notes: Vec<_> = store
        .sorted(method)
        .into_iter()
        .filter(|n| hits.iter().any(|hit| std::ptr::eq(*hit, *n)))
        .collect();

    if json {
        return match serde_json::to_string_pretty(&notes) {
            Ok(out) => {
                println!("{}", out);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        };
    }

    if notes.is_empty() {
        println!("No notes in {}", store.options().root.display());
        return true;
    }

    let root = &store.options().root;
    for note in notes {
        let modified = note.last_modified().with_timezone(&Local);
        println!(
            "{}  {:<30}  {}",
            modified.format("%Y-%m-%d %H:%M"),
            note.name(),
            display_path(root, note.path())
        );
    }
    true
}

/// Handle the show command
pub fn handle_show(app: &mut CliApp, arg: &str) -> bool {
    let Some(path) = resolve(app, arg) else {
        return false;
    };
    let content = app.open_note(&path);
    if app.store().currently_open_path().is_none() {
        eprintln!("✗ Could not read {}", path.display());
        return false;
    }
    print!("{}", content);
    true
}

/// Handle the new command
pub fn handle_new(app: &mut CliApp, name: &str) -> bool {
    match app.store_mut().create(name) {
        Ok(note) => {
            println!("✓ Created {}", note.path().display());
            true
        }
        Err(e) if e.is_conflict() => {
            eprintln!("✗ Name taken or invalid: {}", e);
            false
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Handle the write command: stdin becomes the note's content
pub fn handle_write(app: &mut CliApp, arg: &str, force: bool) -> bool {
    let Some(path) = resolve(app, arg) else {
        return false;
    };

    // baseline first, so a change made while stdin is being read is caught
    app.open_note(&path);

    let mut content = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut content) {
        eprintln!("✗ Failed to read stdin: {}", e);
        return false;
    }

    match app.store_mut().save(&path, &content, force) {
        Ok(SaveOutcome::Written) => {
            println!("✓ Saved {}", path.display());
            true
        }
        Ok(SaveOutcome::Unchanged) => {
            println!("= {} already has this content", path.display());
            true
        }
        Err(NotyError::ExternallyModified(_)) => {
            eprintln!(
                "✗ {} was changed by another program; rerun with --force to overwrite",
                path.display()
            );
            false
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Handle the rm command
pub fn handle_rm(app: &mut CliApp, arg: &str) -> bool {
    let Some(path) = resolve(app, arg) else {
        return false;
    };
    match app.store_mut().delete(&path) {
        Ok(()) => {
            println!("✓ Deleted {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Handle the mv command
pub fn handle_mv(app: &mut CliApp, arg: &str, new_name: &str) -> bool {
    let Some(path) = resolve(app, arg) else {
        return false;
    };
    match app.store_mut().rename(&path, new_name) {
        Ok(note) => {
            println!("✓ Renamed {} → {}", path.display(), note.path().display());
            true
        }
        Err(e) if e.is_conflict() => {
            eprintln!("✗ Name taken or invalid: {}", e);
            false
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Handle the reload command
pub fn handle_reload(app: &mut CliApp) -> bool {
    let count = app.store_mut().reload(ReloadTrigger::Explicit);
    let stats = app.store().last_scan();
    let options = app.store().options();

    if stats.root_missing {
        eprintln!("✗ Notes directory {} does not exist", options.root.display());
        return false;
    }

    println!("Notes directory: {}", options.root.display());
    println!("Recursive:       {}", options.recursive);
    println!(
        "Extension:       .{} ({})",
        options.policy.extension,
        if options.policy.require_extension {
            "required"
        } else {
            "optional"
        }
    );
    println!("Loaded:          {}", count);
    println!("Skipped:         {}", stats.skipped);
    if stats.failed > 0 {
        println!("Failed:          {}", stats.failed);
        return false;
    }
    true
}
