//! Importing filesystem directories as snapshot trees.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::store::Store;
use crate::tree::{EntryType, TreeEntry, file_modes};
use std::fs;
use std::path::Path;

impl Store {
    /// Import a file or directory into the store.
    ///
    /// A file becomes a blob; a directory becomes a tree built recursively
    /// from its contents. `.gitignore` rules are respected. Returns the hash
    /// of the imported root object.
    pub fn import_path(&self, path: &Path) -> Result<Hash> {
        if !path.exists() {
            return Err(Error::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Path does not exist: {}", path.display()),
                ),
            });
        }

        let metadata = fs::metadata(path)?;

        if metadata.is_file() {
            self.import_file(path)
        } else if metadata.is_dir() {
            self.import_directory(path)
        } else {
            Err(Error::invalid_object(format!(
                "Unsupported file type: {}",
                path.display()
            )))
        }
    }

    /// Import a single file as a blob.
    fn import_file(&self, path: &Path) -> Result<Hash> {
        let file = fs::File::open(path)?;
        self.put_blob(file)
    }

    /// Import a directory recursively as a tree.
    fn import_directory(&self, path: &Path) -> Result<Hash> {
        let mut entries = Vec::new();

        // One level at a time; recursion handles subdirectories
        let walker = ignore::WalkBuilder::new(path)
            .max_depth(Some(1))
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let entry_path = entry.path();

            // The walker reports the directory itself first
            if entry_path == path {
                continue;
            }

            let metadata = entry_path.metadata()?;
            let file_name = entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Error::invalid_tree_entry(format!(
                        "Invalid filename: {}",
                        entry_path.display()
                    ))
                })?
                .to_string();

            if metadata.is_file() {
                let mode = get_file_mode(&metadata);
                let hash = self.import_file(entry_path)?;
                entries.push(TreeEntry::new(EntryType::Blob, mode, hash, file_name)?);
            } else if metadata.is_dir() {
                let hash = self.import_directory(entry_path)?;
                entries.push(TreeEntry::new(
                    EntryType::Tree,
                    file_modes::DIRECTORY,
                    hash,
                    file_name,
                )?);
            } else if metadata.is_symlink() {
                return Err(Error::invalid_object(format!(
                    "Symlinks not supported: {}",
                    entry_path.display()
                )));
            }
        }

        self.put_tree(entries)
    }
}

/// Get the file mode (permissions) from metadata.
#[cfg(unix)]
fn get_file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        file_modes::EXECUTABLE
    } else {
        file_modes::REGULAR
    }
}

/// Get the file mode (permissions) from metadata (Windows fallback).
#[cfg(not(unix))]
fn get_file_mode(_metadata: &fs::Metadata) -> u32 {
    file_modes::REGULAR
}
