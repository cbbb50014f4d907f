//! File management over the two dashboard folders.
//!
//! `source` holds evaluator output (reports, generated test configurations);
//! `target` holds the test configurations currently mounted for the test
//! runner. Every operation checks its preconditions first and leaves both
//! folders untouched when it rejects a request.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::FileOpError;

/// Format of `FileEntry::modified`
pub const MODIFIED_FORMAT: &str = "%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    Source,
    Target,
}

impl Folder {
    pub fn parse(s: &str) -> Result<Self, FileOpError> {
        match s {
            "source" => Ok(Folder::Source),
            "target" => Ok(Folder::Target),
            other => Err(FileOpError::InvalidFolder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Local modification time, empty for directories
    pub modified: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Operations over the source and target folders.
#[derive(Debug, Clone)]
pub struct FileManager {
    source_dir: PathBuf,
    target_dir: PathBuf,
}

impl FileManager {
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
        }
    }

    pub fn dir(&self, folder: Folder) -> &Path {
        match folder {
            Folder::Source => &self.source_dir,
            Folder::Target => &self.target_dir,
        }
    }

    /// List a folder sorted by name. A missing folder lists as empty.
    pub fn list(&self, folder: Folder) -> Result<Vec<FileEntry>, FileOpError> {
        let dir = self.dir(folder);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // follow symlinks; a dangling link is neither file nor directory and is skipped
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(_) => entry.metadata()?,
            };

            if metadata.is_dir() {
                entries.push(FileEntry {
                    name,
                    size: 0,
                    modified: String::new(),
                    kind: EntryKind::Directory,
                });
            } else if metadata.is_file() {
                let modified = metadata
                    .modified()
                    .map(|t| DateTime::<Local>::from(t).format(MODIFIED_FORMAT).to_string())
                    .unwrap_or_default();
                entries.push(FileEntry {
                    name,
                    size: metadata.len(),
                    modified,
                    kind: EntryKind::File,
                });
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Rename an entry inside one folder.
    pub fn rename(&self, folder: Folder, old_name: &str, new_name: &str) -> Result<(), FileOpError> {
        let old_path = self.entry_path(folder, old_name)?;
        let new_path = self.entry_path(folder, new_name)?;

        if !exists(&old_path) {
            return Err(FileOpError::NotFound(old_name.to_string()));
        }
        if exists(&new_path) {
            return Err(FileOpError::AlreadyExists(new_name.to_string()));
        }

        fs::rename(&old_path, &new_path)?;
        info!(?folder, old_name, new_name, "renamed file");
        Ok(())
    }

    /// Copy a file from the source folder into the target folder, keeping its
    /// modification time. The target folder is created when missing.
    pub fn transfer(&self, name: &str) -> Result<(), FileOpError> {
        let source_path = self.entry_path(Folder::Source, name)?;
        let target_path = self.entry_path(Folder::Target, name)?;

        if !exists(&source_path) {
            return Err(FileOpError::NotFound(name.to_string()));
        }
        if exists(&target_path) {
            return Err(FileOpError::AlreadyExists(name.to_string()));
        }
        if source_path.is_dir() {
            return Err(FileOpError::IsDirectory(name.to_string()));
        }

        fs::create_dir_all(&self.target_dir)?;
        fs::copy(&source_path, &target_path)?;
        if let Ok(modified) = fs::metadata(&source_path).and_then(|m| m.modified()) {
            File::options()
                .write(true)
                .open(&target_path)?
                .set_modified(modified)?;
        }

        info!(name, "transferred file to target folder");
        Ok(())
    }

    /// Delete a file or a whole directory from a folder.
    pub fn delete(&self, folder: Folder, name: &str) -> Result<(), FileOpError> {
        let path = self.entry_path(folder, name)?;
        if !exists(&path) {
            return Err(FileOpError::NotFound(name.to_string()));
        }

        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }

        info!(?folder, name, "deleted file");
        Ok(())
    }

    fn entry_path(&self, folder: Folder, name: &str) -> Result<PathBuf, FileOpError> {
        validate_name(name)?;
        Ok(self.dir(folder).join(name))
    }
}

/// Existence check that also sees dangling symlinks.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Entry names must be a single path component.
fn validate_name(name: &str) -> Result<(), FileOpError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        Err(FileOpError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
