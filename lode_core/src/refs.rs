//! Named references to snapshot roots.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::store::Store;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Manages named references in the store.
///
/// A reference is an append-only file under `refs/`; each update appends one
/// hash line and the last valid line is the current value, so old roots stay
/// recoverable.
pub struct RefManager<'a> {
    store: &'a Store,
}

impl<'a> RefManager<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get the path to a reference file, validating the name.
    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(Error::invalid_ref("Ref name cannot be empty"));
        }

        // No path traversal through ref names
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(Error::invalid_ref(format!(
                "Invalid ref name: {} (must not contain .. or path separators)",
                name
            )));
        }

        Ok(self.store.root().join("refs").join(name))
    }

    /// Add or update a reference.
    pub fn add(&self, name: &str, hash: &Hash) -> Result<()> {
        let path = self.ref_path(name)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        writeln!(file, "{}", hash.to_hex())?;

        Ok(())
    }

    /// Get the current value of a reference, if it exists.
    pub fn get(&self, name: &str) -> Result<Option<Hash>> {
        let path = self.ref_path(name)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let mut current = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Ok(hash) = Hash::from_hex(line) {
                current = Some(hash);
            }
        }

        Ok(current)
    }

    /// List all references as sorted (name, hash) pairs.
    pub fn list(&self) -> Result<Vec<(String, Hash)>> {
        let refs_dir = self.store.root().join("refs");
        let mut refs = Vec::new();

        if !refs_dir.exists() {
            return Ok(refs);
        }

        for entry in fs::read_dir(&refs_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if let Some(hash) = self.get(name)? {
                refs.push((name.to_string(), hash));
            }
        }

        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    /// Remove a reference.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.ref_path(name)?;

        if !path.exists() {
            return Err(Error::ref_not_found(name));
        }

        fs::remove_file(&path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Algorithm;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("store"), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_add_get() {
        let (_tmp, store) = test_store();
        let hash = Hash::hash_bytes(b"root");

        store.refs().add("main", &hash).unwrap();
        assert_eq!(store.refs().get("main").unwrap(), Some(hash));
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_tmp, store) = test_store();
        assert_eq!(store.refs().get("absent").unwrap(), None);
    }

    #[test]
    fn test_update_keeps_last_value() {
        let (_tmp, store) = test_store();
        let first = Hash::hash_bytes(b"first");
        let second = Hash::hash_bytes(b"second");

        store.refs().add("main", &first).unwrap();
        store.refs().add("main", &second).unwrap();
        assert_eq!(store.refs().get("main").unwrap(), Some(second));
    }

    #[test]
    fn test_list_sorted() {
        let (_tmp, store) = test_store();
        let hash = Hash::hash_bytes(b"x");

        store.refs().add("zoo", &hash).unwrap();
        store.refs().add("alpha", &hash).unwrap();

        let refs = store.refs().list().unwrap();
        let names: Vec<_> = refs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zoo"]);
    }

    #[test]
    fn test_remove() {
        let (_tmp, store) = test_store();
        let hash = Hash::hash_bytes(b"x");

        store.refs().add("gone", &hash).unwrap();
        store.refs().remove("gone").unwrap();
        assert_eq!(store.refs().get("gone").unwrap(), None);

        assert!(matches!(
            store.refs().remove("gone"),
            Err(Error::RefNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_tmp, store) = test_store();
        let hash = Hash::hash_bytes(b"x");

        assert!(store.refs().add("", &hash).is_err());
        assert!(store.refs().add("../escape", &hash).is_err());
        assert!(store.refs().add("a/b", &hash).is_err());
    }
}
