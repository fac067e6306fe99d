//! Dataset descriptors and access to their inner trees.

use crate::error::Result;
use crate::hash::Hash;
use crate::scan::DATASET_DIRNAME;
use crate::store::Store;
use crate::tree::TreeEntry;
use crate::walk::join_path;

/// Name of the subtree holding feature blobs inside a marker directory.
const FEATURE_DIRNAME: &str = "feature";

/// A discovered dataset.
///
/// References the store and the *resolved* root tree of the dataset, which is
/// the directory that directly contains the marker. Descriptors are created
/// once per discovery and never mutated.
pub struct Dataset<'a> {
    store: &'a Store,
    root: Hash,
    path: String,
}

impl<'a> Dataset<'a> {
    pub(crate) fn new(store: &'a Store, root: Hash, path: String) -> Self {
        Self { store, root, path }
    }

    /// Path of the dataset root within the snapshot (empty at the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Content identity of the dataset's root tree.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// The store this dataset lives in.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// Load the entries of the dataset's root tree.
    pub fn tree(&self) -> Result<Vec<TreeEntry>> {
        self.store.get_tree(&self.root)
    }

    /// Resolve the marker subtree (`<root>/.table-dataset`).
    pub fn inner_tree(&self) -> Result<Hash> {
        self.store.lookup_path(&self.root, DATASET_DIRNAME)
    }

    /// Resolve the feature subtree (`<root>/.table-dataset/feature`).
    pub fn feature_tree(&self) -> Result<Hash> {
        let path = format!("{}/{}", DATASET_DIRNAME, FEATURE_DIRNAME);
        self.store.lookup_path(&self.root, &path)
    }

    /// Iterate over every feature blob in the dataset.
    ///
    /// Yields `(path, entry)` pairs in preorder, with paths relative to the
    /// feature tree. Trees are loaded lazily as the iterator advances, so
    /// store errors surface per item.
    pub fn feature_blobs(&self) -> Result<FeatureBlobs<'a>> {
        let feature_root = self.feature_tree()?;
        let entries = self.store.get_tree(&feature_root)?;
        Ok(FeatureBlobs {
            store: self.store,
            stack: vec![(String::new(), entries.into_iter())],
        })
    }
}

/// Preorder iterator over the blobs beneath a dataset's feature tree.
pub struct FeatureBlobs<'a> {
    store: &'a Store,
    stack: Vec<(String, std::vec::IntoIter<TreeEntry>)>,
}

impl Iterator for FeatureBlobs<'_> {
    type Item = Result<(String, TreeEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (parent_path, entry) = loop {
                let top = self.stack.last_mut()?;
                match top.1.next() {
                    Some(entry) => break (top.0.clone(), entry),
                    None => {
                        self.stack.pop();
                    }
                }
            };

            let path = join_path(&parent_path, &entry.name);
            if entry.is_tree() {
                match self.store.get_tree(&entry.hash) {
                    Ok(entries) => self.stack.push((path, entries.into_iter())),
                    Err(e) => return Some(Err(e)),
                }
            } else {
                return Some(Ok((path, entry)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hash::Algorithm;
    use crate::tree::{EntryType, file_modes};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("store"), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    fn blob_entry(store: &Store, name: &str, content: &[u8]) -> TreeEntry {
        let hash = store.put_blob(content).unwrap();
        TreeEntry::new(EntryType::Blob, file_modes::REGULAR, hash, name.to_string()).unwrap()
    }

    fn tree_entry(name: &str, hash: Hash) -> TreeEntry {
        TreeEntry::new(EntryType::Tree, file_modes::DIRECTORY, hash, name.to_string()).unwrap()
    }

    /// Builds `places/.table-dataset/{meta/title, feature/ab/cd/<blobs>}` and
    /// returns the snapshot root.
    fn dataset_snapshot(store: &Store) -> Hash {
        let shard_inner = store
            .put_tree(vec![
                blob_entry(store, "feature-1", b"geom-1"),
                blob_entry(store, "feature-2", b"geom-2"),
            ])
            .unwrap();
        let shard = store.put_tree(vec![tree_entry("cd", shard_inner)]).unwrap();
        let feature = store.put_tree(vec![tree_entry("ab", shard)]).unwrap();
        let meta = store
            .put_tree(vec![blob_entry(store, "title", b"Places")])
            .unwrap();
        let marker = store
            .put_tree(vec![tree_entry("feature", feature), tree_entry("meta", meta)])
            .unwrap();
        let places = store
            .put_tree(vec![tree_entry(DATASET_DIRNAME, marker)])
            .unwrap();
        store.put_tree(vec![tree_entry("places", places)]).unwrap()
    }

    fn single_dataset(store: &Store, root: Hash) -> Dataset<'_> {
        let mut datasets = store.snapshot(root).datasets().unwrap();
        assert_eq!(datasets.len(), 1);
        datasets.remove(0)
    }

    #[test]
    fn test_inner_and_feature_trees_resolve() {
        let (_tmp, store) = test_store();
        let root = dataset_snapshot(&store);
        let dataset = single_dataset(&store, root);

        assert_eq!(dataset.path(), "places");

        let inner = dataset.inner_tree().unwrap();
        let inner_entries = store.get_tree(&inner).unwrap();
        assert!(inner_entries.iter().any(|e| e.name == "feature"));

        let feature = dataset.feature_tree().unwrap();
        assert!(store.get_tree(&feature).is_ok());
    }

    #[test]
    fn test_feature_blobs_preorder() {
        let (_tmp, store) = test_store();
        let root = dataset_snapshot(&store);
        let dataset = single_dataset(&store, root);

        let blobs: Vec<_> = dataset
            .feature_blobs()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let paths: Vec<_> = blobs.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["ab/cd/feature-1", "ab/cd/feature-2"]);

        // Entries reference real blob content
        let (_, entry) = &blobs[0];
        assert_eq!(store.get_blob(&entry.hash).unwrap(), b"geom-1");
    }

    #[test]
    fn test_feature_blobs_without_feature_tree() {
        let (_tmp, store) = test_store();

        // Marker with meta only, no feature subtree
        let meta = store
            .put_tree(vec![blob_entry(&store, "title", b"Empty")])
            .unwrap();
        let marker = store.put_tree(vec![tree_entry("meta", meta)]).unwrap();
        let dir = store
            .put_tree(vec![tree_entry(DATASET_DIRNAME, marker)])
            .unwrap();
        let root = store.put_tree(vec![tree_entry("bare", dir)]).unwrap();

        let dataset = single_dataset(&store, root);
        assert!(matches!(
            dataset.feature_blobs(),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_dataset_tree_loads_root_entries() {
        let (_tmp, store) = test_store();
        let root = dataset_snapshot(&store);
        let dataset = single_dataset(&store, root);

        let entries = dataset.tree().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, DATASET_DIRNAME);
        assert!(entries[0].is_tree());
    }
}
