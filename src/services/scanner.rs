//! Local directory enumeration for upload work lists.

use crate::error::{Result, UploadError};
use crate::models::WorkItem;
use crate::utils::keys::storage_key;
use crate::utils::validation::{has_extension, normalize_extension};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A matching file found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path as found on disk.
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl LocalFile {
    pub fn into_work_item(self, prefix: &str) -> WorkItem {
        let key = storage_key(prefix, &self.relative);
        WorkItem::local(self.path, key, self.size)
    }
}

/// Finds files with a given extension under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    extension: String,
    recursive: bool,
}

impl DirectoryScanner {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: normalize_extension(extension).to_string(),
            recursive: true,
        }
    }

    /// Only look at the root's direct children.
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lazily walks the tree. Order is unspecified.
    ///
    /// # Errors
    /// `NotFound` if the root does not exist or is not a directory. Entries
    /// that cannot be read are yielded as `Err` items.
    pub fn scan(&self) -> Result<impl Iterator<Item = Result<LocalFile>> + '_> {
        if !self.root.is_dir() {
            return Err(UploadError::NotFound(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root).follow_links(false).min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        Ok(walker.into_iter().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(UploadError::Io(e.into()))),
            };

            let path = entry.path();
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && path.is_file());
            if !is_file || !has_extension(path, &self.extension) {
                return None;
            }

            let relative = path.strip_prefix(&self.root).ok()?.to_path_buf();
            let size = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta.len(),
                _ => match std::fs::metadata(path) {
                    Ok(meta) => meta.len(),
                    Err(e) => return Some(Err(UploadError::Io(e))),
                },
            };

            Some(Ok(LocalFile {
                path: path.to_path_buf(),
                relative,
                size,
            }))
        }))
    }

    /// Scans and returns the matches sorted by relative path. Unreadable
    /// entries are logged and skipped.
    pub fn collect_sorted(&self) -> Result<Vec<LocalFile>> {
        let mut files: Vec<LocalFile> = self
            .scan()?
            .filter_map(|entry| match entry {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    None
                }
            })
            .collect();
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }
}
