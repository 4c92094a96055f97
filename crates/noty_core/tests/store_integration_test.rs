//! Integration tests against the real filesystem

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, SystemTime};

use noty_core::fs::RealFileSystem;
use noty_core::{
    ConfigKey, ConfigStore, ExtensionPolicy, NoteStore, NotyApp, NotyError, ReloadTrigger,
    SaveOutcome, ScanOptions, StoreEvent, Theme,
};
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Set a file's mtime the way `touch -d` would.
fn touch(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

fn store(root: &Path, recursive: bool, require_extension: bool) -> NoteStore<RealFileSystem> {
    let options = ScanOptions::new(root)
        .recursive(recursive)
        .policy(ExtensionPolicy::new(require_extension, "md"));
    let mut store = NoteStore::new(RealFileSystem, options);
    store.reload(ReloadTrigger::Explicit);
    store
}

fn external_changes(rx: &Receiver<StoreEvent>) -> usize {
    rx.try_iter()
        .filter(|e| matches!(e, StoreEvent::NoteExternallyChanged { .. }))
        .count()
}

#[test]
fn recursive_scan_with_extension_mode() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.md"), "");
    write(&root.join("sub/b.md"), "");
    write(&root.join("sub/.hidden.md"), "");

    let store = store(root, true, true);
    let mut found: Vec<PathBuf> = store.notes().iter().map(|n| n.path().to_path_buf()).collect();
    found.sort();
    assert_eq!(found, vec![root.join("a.md"), root.join("sub/b.md")]);
}

#[cfg(unix)]
#[test]
fn recursive_scan_stops_at_symlink_loop() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.md"), "");
    write(&root.join("sub/b.md"), "");
    std::os::unix::fs::symlink(root, root.join("loop")).unwrap();
    std::os::unix::fs::symlink(root.join("sub"), root.join("sub/again")).unwrap();

    let store = store(root, true, true);
    let mut found: Vec<PathBuf> = store.notes().iter().map(|n| n.path().to_path_buf()).collect();
    found.sort();
    assert_eq!(found, vec![root.join("a.md"), root.join("sub/b.md")]);
}

#[test]
fn flat_scan_applies_extension_rule() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.md"), "");
    write(&root.join("plain"), "");
    write(&root.join("other.txt"), "");
    write(&root.join(".secret"), "");
    fs::create_dir(root.join("folder.md")).unwrap();

    let store = store(root, false, false);
    let names: Vec<&str> = store.notes().iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["a", "plain"]);
    assert_eq!(store.last_scan().skipped, 2);
}

#[test]
fn missing_root_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir.path().join("nope"), false, false);
    assert!(store.is_empty());
    assert!(store.last_scan().root_missing);
}

#[test]
fn save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.md");
    write(&path, "");
    let mut store = store(dir.path(), false, true);

    store.load(Some(&path));
    let content = "line one\nline two\n\u{1F4DD} unicode\n";
    store.save(&path, content, false).unwrap();
    assert_eq!(store.load(Some(&path)), content);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn identical_save_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.md");
    write(&path, "same");
    let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    touch(&path, old);

    let mut store = store(dir.path(), false, true);
    store.load(Some(&path));
    assert_eq!(store.save(&path, "same", false).unwrap(), SaveOutcome::Unchanged);
    assert_eq!(store.save(&path, "same", false).unwrap(), SaveOutcome::Unchanged);
    assert_eq!(mtime(&path), old);
}

#[test]
fn external_edit_blocks_save_until_resolved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.md");
    write(&path, "original");
    let mut store = store(dir.path(), false, true);
    let (_id, rx) = store.subscribe_channel();

    store.load(Some(&path));
    store.save(&path, "ours", false).unwrap();

    // another program writes a second later
    fs::write(&path, "theirs").unwrap();
    touch(&path, SystemTime::now() + Duration::from_secs(1));

    let err = store.save(&path, "ours, edited", false).unwrap_err();
    assert!(matches!(err, NotyError::ExternallyModified(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "theirs");
    assert_eq!(external_changes(&rx), 1);

    assert!(store.save(&path, "ours, edited", false).is_err());
    assert_eq!(external_changes(&rx), 0);

    assert_eq!(
        store.save(&path, "ours, edited", true).unwrap(),
        SaveOutcome::Written
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "ours, edited");
}

#[test]
fn focus_check_sees_external_edit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.md");
    write(&path, "original");
    let mut store = store(dir.path(), false, true);

    store.load(Some(&path));
    assert!(!store.check_external_modification(&path));

    touch(&path, SystemTime::now() + Duration::from_secs(2));
    assert!(store.check_external_modification(&path));

    store.load(Some(&path));
    assert!(!store.check_external_modification(&path));
}

#[test]
fn create_rename_delete() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let mut store = store(root, false, true);

    let created = store.create("x").unwrap().path().to_path_buf();
    assert_eq!(created, root.join("x.md"));
    assert!(created.is_file());
    assert!(store.create("x").unwrap_err().is_conflict());
    assert_eq!(store.len(), 1);

    write(&root.join("new.md"), "keep");
    store.reload(ReloadTrigger::Explicit);
    let err = store.rename(&created, "new").unwrap_err();
    assert!(err.is_conflict());
    assert!(created.is_file());
    assert_eq!(fs::read_to_string(root.join("new.md")).unwrap(), "keep");

    let renamed = store.rename(&created, "y").unwrap().path().to_path_buf();
    assert_eq!(renamed, root.join("y.md"));
    assert!(!created.exists());

    store.load(Some(&renamed));
    store.delete(&renamed).unwrap();
    assert!(!renamed.exists());
    assert!(store.currently_open_path().is_none());
    assert!(store.save(&renamed, "x", false).is_err());
}

#[test]
fn config_backfill_is_written_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noty/config.json");
    write(&path, r#"{"notes_dir": "/tmp/notes", "dark_mode": true}"#);

    let config = ConfigStore::load(RealFileSystem, &path).unwrap();
    assert_eq!(config.get(ConfigKey::FontSize), serde_json::json!(12));
    assert_eq!(config.theme(), Theme::Dark);

    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["font_size"], 12);
    assert_eq!(on_disk["theme"], "dark");
    assert_eq!(on_disk["notes_dir"], "/tmp/notes");
}

#[test]
fn app_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    let notes = dir.path().join("notes");
    write(
        &config_path,
        &format!(r#"{{"notes_dir": {:?}}}"#, notes.to_string_lossy()),
    );

    let mut app = NotyApp::new(RealFileSystem, &config_path).unwrap();
    assert!(notes.is_dir());

    let path = app.store_mut().create("journal").unwrap().path().to_path_buf();
    app.open_note(&path);
    app.shutdown(None, Some("day one")).unwrap();

    let mut app = NotyApp::new(RealFileSystem, &config_path).unwrap();
    assert_eq!(app.reopen_last().as_deref(), Some("day one"));

    app.update_setting(ConfigKey::UseFileExtension, true).unwrap();
    // "journal" has no extension, so it drops out of the listing
    assert!(app.store().is_empty());
}
