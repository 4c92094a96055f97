//! The note entity: one file on disk.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{NotyError, Result};
use crate::events::NoteField;
use crate::fs::FileSystem;

/// One note file tracked by the store.
///
/// The display name is always derived from the path. The timestamp is the
/// modification time captured at construction or rename and is only refreshed
/// through [`Note::refresh_timestamp`].
#[derive(Debug, Serialize)]
pub struct Note {
    path: PathBuf,
    name: String,
    last_modified: DateTime<Utc>,
}

impl Note {
    /// Build a note for an existing file.
    ///
    /// Fails with [`NotyError::NotFound`] when nothing exists at `path`.
    pub fn create<FS: FileSystem>(fs: &FS, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let last_modified = read_modified(fs, &path)?;
        Ok(Self {
            name: display_name(&path),
            path,
            last_modified,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Exact path identity (no normalisation, no case folding).
    pub fn matches_path(&self, path: &Path) -> bool {
        self.path.as_os_str() == path.as_os_str()
    }

    /// Re-read the modification time. Returns `true` if it changed.
    pub fn refresh_timestamp<FS: FileSystem>(&mut self, fs: &FS) -> Result<bool> {
        let modified = read_modified(fs, &self.path)?;
        if modified == self.last_modified {
            return Ok(false);
        }
        self.last_modified = modified;
        Ok(true)
    }

    /// Point the note at `new_path` after the file has been renamed on disk.
    ///
    /// Path, name and timestamp are all recomputed; the returned fields are the
    /// ones to announce. The file itself is not touched.
    pub fn apply_rename<FS: FileSystem>(
        &mut self,
        fs: &FS,
        new_path: impl Into<PathBuf>,
    ) -> Result<Vec<NoteField>> {
        let new_path = new_path.into();
        let last_modified = read_modified(fs, &new_path)?;

        self.name = display_name(&new_path);
        self.path = new_path;
        self.last_modified = last_modified;

        Ok(vec![NoteField::Name, NoteField::Path, NoteField::LastModified])
    }
}

fn read_modified<FS: FileSystem>(fs: &FS, path: &Path) -> Result<DateTime<Utc>> {
    match fs.modified_time(path) {
        Ok(time) => Ok(DateTime::<Utc>::from(time)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(NotyError::NotFound(path.to_path_buf())),
        Err(source) => Err(NotyError::FileRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// File name without its last extension, or the whole file name if that would
/// leave nothing.
pub(crate) fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !stem.is_empty() {
        return stem;
    }
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
