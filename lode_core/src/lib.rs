//! # Lode Core
//!
//! Dataset discovery over a content-addressed tree store.
//!
//! Repository snapshots are immutable trees of BLAKE3-addressed objects. A
//! directory anywhere in a snapshot becomes a *dataset* by containing a
//! reserved marker subtree named `.table-dataset`; this library stores such
//! snapshots and, given a root tree, discovers every dataset in a single
//! preorder walk.
//!
//! ## Features
//!
//! - Content-addressed storage: immutable blob/tree objects with stable IDs
//! - Path lookup and depth-first preorder traversal over stored trees
//! - Dataset discovery: one descriptor per marker, resolved to the marker's
//!   parent tree
//! - Feature blob iteration within a discovered dataset
//! - Named references as snapshot roots, gitignore-aware filesystem import
//!
//! ## Example
//!
//! ```no_run
//! use lode_core::{Algorithm, Store};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::init("./my-store", Algorithm::Blake3)?;
//!
//! // Import a directory tree as a snapshot
//! let root = store.import_path(Path::new("./my-repo"))?;
//! store.refs().add("main", &root)?;
//!
//! // Discover every dataset in the snapshot
//! for dataset in store.snapshot(root).datasets()? {
//!     println!("{} {}", dataset.root(), dataset.path());
//! }
//! # Ok(())
//! # }
//! ```

mod dataset;
mod error;
mod hash;
mod import;
mod object;
mod refs;
mod scan;
mod store;
mod tree;
mod walk;

pub use dataset::{Dataset, FeatureBlobs};
pub use error::{Error, Result};
pub use hash::{Algorithm, Hash};
pub use object::{ObjectHeader, ObjectType};
pub use refs::RefManager;
pub use scan::{DATASET_DIRNAME, Snapshot};
pub use store::Store;
pub use tree::{EntryType, FileMode, TreeEntry};
pub use walk::WalkDecision;
