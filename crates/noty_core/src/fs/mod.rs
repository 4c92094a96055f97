//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait for abstracting filesystem operations,
//! so the note store and configuration store can run against the real disk or
//! against [`InMemoryFileSystem`] in tests.

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

pub use memory::InMemoryFileSystem;
#[cfg(not(target_arch = "wasm32"))]
pub use native::RealFileSystem;

use std::io::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Abstraction over filesystem operations
/// Send + Sync required so a store can be handed to another thread between event-loop turns
pub trait FileSystem: Send + Sync {
    /// Reads the whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Overwrites (or creates) a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Creates a file ONLY if it doesn't exist (for new notes)
    /// Should return an `AlreadyExists` error if the file exists.
    fn create_new(&self, path: &Path, content: &str) -> Result<()>;

    /// Deletes a file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Checks if anything exists at the path
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move/rename a file from `from` to `to`.
    ///
    /// Implementations should error if the source does not exist or if the
    /// destination already exists.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// List the immediate children (files and directories) of a directory.
    /// Returns an empty list when `dir` is not a directory.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// File modification time. `NotFound` if the file does not exist.
    fn modified_time(&self, path: &Path) -> Result<SystemTime>;

    /// Resolve symlinks and relative components.
    /// Filesystems without links return the path unchanged.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        (*self).create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (*self).delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (*self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        (*self).move_file(from, to)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_files(dir)
    }

    fn modified_time(&self, path: &Path) -> Result<SystemTime> {
        (*self).modified_time(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        (*self).canonicalize(path)
    }
}
