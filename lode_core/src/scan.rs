//! Dataset discovery: scanning a snapshot tree for marker directories.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::store::Store;
use crate::walk::WalkDecision;

/// Reserved directory name marking its parent as a dataset root.
pub const DATASET_DIRNAME: &str = ".table-dataset";

/// A read-only view of the snapshot rooted at one tree node.
///
/// Snapshots are cheap to construct and borrow the store; tree nodes are
/// content-addressed, so the view can never observe a change.
pub struct Snapshot<'a> {
    store: &'a Store,
    root: Hash,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(store: &'a Store, root: Hash) -> Self {
        Self { store, root }
    }

    /// The store this snapshot lives in.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// The root tree identity of this snapshot.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Discover every dataset in the snapshot.
    ///
    /// Walks the root tree once in preorder. A dataset is any directory that
    /// directly contains a tree entry named [`DATASET_DIRNAME`]; the emitted
    /// descriptor references that *parent* directory, re-resolved against the
    /// original root, never the marker itself. A marker directly under the
    /// root yields a descriptor for the root with an empty path.
    ///
    /// Once a directory matches, nothing below it is entered again, so a
    /// marker nested inside another dataset's content is not discovered
    /// independently. Output order is traversal preorder and deterministic.
    ///
    /// Any failure to re-resolve a computed parent path is an
    /// [`Error::Integrity`]: the walk and the store disagree about a snapshot
    /// that cannot change, so the whole call fails with no partial results.
    pub fn datasets(&self) -> Result<Vec<Dataset<'a>>> {
        let store = self.store;
        let root = self.root;
        let mut datasets: Vec<Dataset<'a>> = Vec::new();

        store.walk_tree(&root, |parent_path, entry| {
            // The type check is mandatory: a blob that happens to carry the
            // reserved name is not a marker.
            if !(entry.is_tree() && entry.name == DATASET_DIRNAME) {
                // Below an already-discovered dataset root: stay out entirely.
                if covered(&datasets, parent_path) {
                    return Ok(WalkDecision::SkipSubtree);
                }
                return Ok(WalkDecision::Descend);
            }

            // A second marker in a directory already emitted can only come
            // from a corrupt tree; duplicate names are impossible otherwise.
            if datasets.iter().any(|d| d.path() == parent_path) {
                return Err(Error::integrity(
                    parent_path,
                    "duplicate dataset marker for the same directory",
                ));
            }

            // Re-resolve the parent against the original root; the marker's
            // parent tree is what the dataset operates on.
            let parent_hash = store.lookup_path(&root, parent_path).map_err(|e| {
                Error::integrity(
                    parent_path,
                    format!("dataset parent failed to re-resolve: {}", e),
                )
            })?;
            store.get_tree(&parent_hash).map_err(|e| {
                Error::integrity(
                    parent_path,
                    format!("dataset parent is not a readable tree: {}", e),
                )
            })?;

            datasets.push(Dataset::new(store, parent_hash, parent_path.to_string()));
            Ok(WalkDecision::SkipSubtree)
        })?;

        Ok(datasets)
    }
}

/// Whether `path` is at or below any discovered dataset root.
fn covered(datasets: &[Dataset<'_>], path: &str) -> bool {
    datasets.iter().any(|d| {
        let root = d.path();
        root.is_empty() || path == root || path.starts_with(&format!("{}/", root))
    })
}
