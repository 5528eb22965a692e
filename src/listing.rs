//! Directory listing for the browser.
//!
//! Lists the immediate children of one directory, adds a synthetic entry for
//! its parent and orders the result: directories first, then files, each
//! group by case-insensitive path.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// One row of the browser: a child of the working directory or the
/// synthetic parent entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Entry {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    /// Text shown for this entry on screen.
    pub fn label(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn sort_key(&self) -> String {
        self.path.to_string_lossy().to_lowercase()
    }
}

/// Browser ordering: directories before files, then case-insensitive path.
/// Paths that only differ in case fall back to byte order so the result is
/// deterministic.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.sort_key().cmp(&b.sort_key()))
        .then_with(|| a.path.cmp(&b.path))
}

/// Parent of `dir` as shown by the browser. The root is its own parent and
/// a bare relative name has `.` as parent.
pub fn parent_of(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => dir.to_path_buf(),
    }
}

/// List `dir` without recursing.
///
/// Children that cannot be inspected are dropped. An unreadable directory
/// yields only the parent entry, so the result is never empty.
pub fn list_directory(dir: &Path) -> Vec<Entry> {
    let mut entries = Vec::new();

    match fs::read_dir(dir) {
        Ok(read_dir) => {
            for child in read_dir {
                let child = match child {
                    Ok(child) => child,
                    Err(e) => {
                        debug!(directory = %dir.display(), error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                match child.file_type() {
                    Ok(file_type) => entries.push(Entry {
                        path: child.path(),
                        is_dir: file_type.is_dir(),
                    }),
                    Err(e) => {
                        debug!(path = %child.path().display(), error = %e, "Skipping entry without file type");
                    }
                }
            }
        }
        Err(e) => {
            warn!(directory = %dir.display(), error = %e, "Failed to read directory");
        }
    }

    entries.push(Entry::dir(parent_of(dir)));
    entries.sort_by(compare_entries);
    entries
}
