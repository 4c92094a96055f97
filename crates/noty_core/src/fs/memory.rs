//! In-memory filesystem.
//!
//! Clones share the same underlying storage, so a test can hand one clone to a
//! store and keep another to play the part of an external program.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use super::FileSystem;

#[derive(Debug)]
struct MemFile {
    content: String,
    modified: SystemTime,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MemFile>,
    dirs: BTreeSet<PathBuf>,
    writes: usize,
}

impl State {
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// Filesystem kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    state: Arc<Mutex<State>>,
}

impl InMemoryFileSystem {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder pattern). Parent directories are created implicitly.
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        {
            let mut state = self.state();
            let path = path.as_ref();
            state.add_ancestors(path);
            state.files.insert(
                path.to_path_buf(),
                MemFile {
                    content: content.to_string(),
                    modified: SystemTime::now(),
                },
            );
        }
        self
    }

    /// Add an empty directory (builder pattern).
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        {
            let mut state = self.state();
            let path = path.as_ref();
            state.add_ancestors(path);
            state.dirs.insert(path.to_path_buf());
        }
        self
    }

    /// Get the content of a file (for test assertions).
    pub fn get_content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|f| f.content.clone())
    }

    /// Overwrite a file's modification time, as `touch -d` would.
    pub fn set_modified_time(&self, path: impl AsRef<Path>, time: SystemTime) -> Result<()> {
        let mut state = self.state();
        let file = state
            .files
            .get_mut(path.as_ref())
            .ok_or_else(|| not_found(path.as_ref()))?;
        file.modified = time;
        Ok(())
    }

    /// Number of physical writes (`write_file` and `create_new`) performed so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> Error {
    Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path))
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.state()
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut state = self.state();
        if state.dirs.contains(path) {
            return Err(Error::new(
                ErrorKind::IsADirectory,
                format!("Is a directory: {:?}", path),
            ));
        }
        state.add_ancestors(path);
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                content: content.to_string(),
                modified: SystemTime::now(),
            },
        );
        state.writes += 1;
        Ok(())
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        {
            let state = self.state();
            if state.files.contains_key(path) || state.dirs.contains(path) {
                return Err(Error::new(
                    ErrorKind::AlreadyExists,
                    format!("File exists: {:?}", path),
                ));
            }
        }
        self.write_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.state()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        if state.files.contains_key(path) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("A file exists at {:?}", path),
            ));
        }
        state.add_ancestors(path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state();
        if state.files.contains_key(to) || state.dirs.contains(to) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Destination already exists: {:?}", to),
            ));
        }
        let file = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.add_ancestors(to);
        // rename keeps the modification time
        state.files.insert(to.to_path_buf(), file);
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state();
        if !state.dirs.contains(dir) {
            return Ok(vec![]);
        }
        let mut entries: Vec<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn modified_time(&self, path: &Path) -> Result<SystemTime> {
        self.state()
            .files
            .get(path)
            .map(|f| f.modified)
            .ok_or_else(|| not_found(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clones_share_storage() {
        let fs = InMemoryFileSystem::new();
        let other = fs.clone();
        fs.write_file(Path::new("/notes/a.md"), "hello").unwrap();
        assert_eq!(other.get_content("/notes/a.md"), Some("hello".to_string()));
        assert!(other.is_dir(Path::new("/notes")));
        assert_eq!(other.write_count(), 1);
    }

    #[test]
    fn test_create_new_refuses_existing() {
        let fs = InMemoryFileSystem::new().with_file("/notes/a.md", "x");
        let err = fs.create_new(Path::new("/notes/a.md"), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs.get_content("/notes/a.md"), Some("x".to_string()));
    }

    #[test]
    fn test_list_files_is_shallow_and_sorted() {
        let fs = InMemoryFileSystem::new()
            .with_file("/notes/b.md", "")
            .with_file("/notes/a.md", "")
            .with_file("/notes/sub/c.md", "");
        let listed = fs.list_files(Path::new("/notes")).unwrap();
        assert_eq!(
            listed,
            vec![
                PathBuf::from("/notes/a.md"),
                PathBuf::from("/notes/b.md"),
                PathBuf::from("/notes/sub"),
            ]
        );
        assert!(fs.list_files(Path::new("/missing")).unwrap().is_empty());
    }

    #[test]
    fn test_move_keeps_modified_time() {
        let fs = InMemoryFileSystem::new().with_file("/notes/a.md", "x");
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        fs.set_modified_time("/notes/a.md", stamp).unwrap();

        fs.move_file(Path::new("/notes/a.md"), Path::new("/notes/b.md"))
            .unwrap();
        assert!(!fs.exists(Path::new("/notes/a.md")));
        assert_eq!(fs.modified_time(Path::new("/notes/b.md")).unwrap(), stamp);
    }

    #[test]
    fn test_modified_time_missing_file() {
        let fs = InMemoryFileSystem::new();
        let err = fs.modified_time(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
