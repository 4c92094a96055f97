//! Shared CLI utilities

use std::path::{Path, PathBuf};

use noty_core::fs::FileSystem;
use noty_core::{Note, NoteStore};

/// Resolve a NOTE argument to the path of a tracked note.
///
/// Accepts a path (absolute, or relative to the current directory or the
/// notes root) or a display name. Names are matched exactly first, then
/// ignoring case; an ambiguous name is an error.
pub fn resolve_note<FS: FileSystem>(store: &NoteStore<FS>, arg: &str) -> Result<PathBuf, String> {
    let as_path = Path::new(arg);
    let mut candidates = vec![as_path.to_path_buf(), store.options().root.join(as_path)];
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(as_path));
    }
    if let Some(note) = candidates.iter().find_map(|p| store.find(p)) {
        return Ok(note.path().to_path_buf());
    }

    let exact: Vec<&Note> = store.notes().iter().filter(|n| n.name() == arg).collect();
    let matches = if exact.is_empty() {
        store
            .notes()
            .iter()
            .filter(|n| n.name().eq_ignore_ascii_case(arg))
            .collect()
    } else {
        exact
    };

    match matches.as_slice() {
        [note] => Ok(note.path().to_path_buf()),
        [] => Err(format!("No note named '{}'", arg)),
        many => {
            let paths: Vec<String> = many.iter().map(|n| n.path().display().to_string()).collect();
            Err(format!(
                "'{}' matches several notes, pass a path instead:\n  {}",
                arg,
                paths.join("\n  ")
            ))
        }
    }
}

/// Path relative to the notes root, for display.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use noty_core::fs::{InMemoryFileSystem, RealFileSystem};
    use noty_core::{ExtensionPolicy, ReloadTrigger, ScanOptions};

    fn store(fs: InMemoryFileSystem) -> NoteStore<InMemoryFileSystem> {
        let options = ScanOptions::new("/notes")
            .recursive(true)
            .policy(ExtensionPolicy::new(false, "md"));
        let mut store = NoteStore::new(fs, options);
        store.reload(ReloadTrigger::Explicit);
        store
    }

    #[test]
    fn test_resolve_by_name_and_path() {
        let store = store(
            InMemoryFileSystem::new()
                .with_file("/notes/todo.md", "")
                .with_file("/notes/work/Plan", ""),
        );

        assert_eq!(resolve_note(&store, "todo").unwrap(), PathBuf::from("/notes/todo.md"));
        assert_eq!(resolve_note(&store, "plan").unwrap(), PathBuf::from("/notes/work/Plan"));
        assert_eq!(
            resolve_note(&store, "/notes/todo.md").unwrap(),
            PathBuf::from("/notes/todo.md")
        );
        assert_eq!(
            resolve_note(&store, "work/Plan").unwrap(),
            PathBuf::from("/notes/work/Plan")
        );
        assert!(resolve_note(&store, "missing").is_err());
    }

    #[test]
    fn test_ambiguous_name() {
        let store = store(
            InMemoryFileSystem::new()
                .with_file("/notes/a/idea.md", "")
                .with_file("/notes/b/idea.md", ""),
        );
        let err = resolve_note(&store, "idea").unwrap_err();
        assert!(err.contains("several"));
        assert!(resolve_note(&store, "a/idea.md").is_ok());
    }

    #[test]
    fn test_resolve_in_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("work")).unwrap();
        std::fs::write(root.join("work/report.md"), "draft").unwrap();
        std::fs::write(root.join("notes.txt"), "").unwrap();

        let options = ScanOptions::new(root)
            .recursive(true)
            .policy(ExtensionPolicy::new(true, "md"));
        let mut store = NoteStore::new(RealFileSystem, options);
        store.reload(ReloadTrigger::Explicit);

        let expected = root.join("work/report.md");
        assert_eq!(resolve_note(&store, "report").unwrap(), expected);
        assert_eq!(resolve_note(&store, "work/report.md").unwrap(), expected);
        assert_eq!(
            resolve_note(&store, &expected.to_string_lossy()).unwrap(),
            expected
        );
        assert!(resolve_note(&store, "notes").is_err());
        assert_eq!(display_path(root, &expected), "work/report.md");
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(Path::new("/notes"), Path::new("/notes/work/a.md")),
            "work/a.md"
        );
        assert_eq!(display_path(Path::new("/notes"), Path::new("/x/a.md")), "/x/a.md");
    }
}
