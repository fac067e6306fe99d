//! Depth-first preorder traversal of stored trees.

use crate::error::Result;
use crate::hash::Hash;
use crate::store::Store;
use crate::tree::TreeEntry;

/// What the visitor wants the traversal to do after an entry.
///
/// For tree entries the decision controls descent; for blob entries it is
/// ignored (there is nothing below a blob to descend into).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDecision {
    /// Continue descending into this entry's subtree.
    Descend,
    /// Do not visit anything below this entry.
    SkipSubtree,
}

/// Join a parent path and an entry name into the entry's own path.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

impl Store {
    /// Walk the tree rooted at `root` depth-first in preorder.
    ///
    /// The visitor is invoked once per entry with the path of the directory
    /// containing the entry (empty for entries directly under the root) and
    /// the entry itself. Siblings are visited in canonical name order, which
    /// is the order [`Store::get_tree`] reports them in.
    ///
    /// A visitor error aborts the walk immediately and propagates.
    pub fn walk_tree<F>(&self, root: &Hash, mut visitor: F) -> Result<()>
    where
        F: FnMut(&str, &TreeEntry) -> Result<WalkDecision>,
    {
        self.walk_subtree(root, "", &mut visitor)
    }

    fn walk_subtree<F>(&self, tree: &Hash, parent_path: &str, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&str, &TreeEntry) -> Result<WalkDecision>,
    {
        let entries = self.get_tree(tree)?;

        for entry in &entries {
            let decision = visitor(parent_path, entry)?;

            if entry.is_tree() && decision == WalkDecision::Descend {
                let child_path = join_path(parent_path, &entry.name);
                self.walk_subtree(&entry.hash, &child_path, visitor)?;
            }
        }

        Ok(())
    }
}
