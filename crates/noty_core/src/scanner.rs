//! Note directory scanner.
//!
//! Walks the notes root (flat or recursive) and builds a fresh [`Note`] for
//! every eligible file. A scan never reuses a previous result.

use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::note::Note;

/// Which file names count as notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    /// When set, only files ending in `extension` are notes.
    pub require_extension: bool,
    /// Configured extension, without the leading dot.
    pub extension: String,
}

impl ExtensionPolicy {
    pub fn new(require_extension: bool, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            require_extension,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Extension rule for a candidate file.
    ///
    /// With the mode on, the file must carry the configured extension (ASCII
    /// case-insensitive). With it off, the file must carry no extension at all
    /// or the configured one; any other extension is rejected.
    pub fn is_eligible(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy())
            .filter(|e| !e.is_empty());

        let matches = ext
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));

        if self.require_extension {
            matches
        } else {
            ext.is_none() || matches
        }
    }

    /// File name a note called `name` gets on disk.
    pub fn file_name_for(&self, name: &str) -> String {
        if self.require_extension && !self.extension.is_empty() {
            format!("{}.{}", name, self.extension)
        } else {
            name.to_string()
        }
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(false, "md")
    }
}

/// Inputs of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub recursive: bool,
    pub policy: ExtensionPolicy,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            policy: ExtensionPolicy::default(),
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn policy(mut self, policy: ExtensionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Outcome of a scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Notes in traversal order.
    pub notes: Vec<Note>,
    /// Eligible files a note was attempted for.
    pub candidates: usize,
    /// Entries rejected by the hidden-file or extension rule.
    pub skipped: usize,
    /// Eligible files whose note could not be built.
    pub failed: usize,
    /// The root directory does not exist.
    pub root_missing: bool,
}

impl ScanReport {
    /// Number of notes successfully loaded.
    pub fn loaded(&self) -> usize {
        self.notes.len()
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            loaded: self.loaded(),
            candidates: self.candidates,
            skipped: self.skipped,
            failed: self.failed,
            root_missing: self.root_missing,
        }
    }
}

/// Counters of a [`ScanReport`], without the notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub loaded: usize,
    pub candidates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub root_missing: bool,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Scan `options.root` for notes.
///
/// A missing root yields an empty report with `root_missing` set. Failures on
/// individual files are counted and skipped.
pub fn scan<FS: FileSystem>(fs: &FS, options: &ScanOptions) -> ScanReport {
    let mut report = ScanReport::default();

    if !fs.is_dir(&options.root) {
        warn!("Notes directory {:?} not found", options.root);
        report.root_missing = true;
        return report;
    }

    let mut visited = HashSet::new();
    scan_dir(fs, &options.root, options, &mut report, &mut visited);
    debug!(
        "Scanned {:?}: {} loaded, {} skipped, {} failed",
        options.root,
        report.loaded(),
        report.skipped,
        report.failed
    );
    report
}

fn scan_dir<FS: FileSystem>(
    fs: &FS,
    dir: &Path,
    options: &ScanOptions,
    report: &mut ScanReport,
    visited: &mut HashSet<PathBuf>,
) {
    // Avoid cycles through directory symlinks
    let canonical = fs.canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if !visited.insert(canonical) {
        debug!("Already scanned {:?}, skipping", dir);
        return;
    }

    let entries = match fs.list_files(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries {
        if fs.is_dir(&entry) {
            if !options.recursive {
                continue;
            }
            if is_hidden(&entry) {
                debug!("Skipping hidden directory {:?}", entry);
                report.skipped += 1;
                continue;
            }
            scan_dir(fs, &entry, options, report, visited);
            continue;
        }

        if !fs.is_file(&entry) {
            continue;
        }
        if is_hidden(&entry) || !options.policy.is_eligible(&entry) {
            report.skipped += 1;
            continue;
        }

        report.candidates += 1;
        match Note::create(fs, &entry) {
            Ok(note) => report.notes.push(note),
            Err(e) => {
                warn!("Skipping {:?}: {}", entry, e);
                report.failed += 1;
            }
        }
    }
}
