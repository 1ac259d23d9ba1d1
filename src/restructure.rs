//! Structural vtree edits: rotations and swaps.
//!
//! ```text
//!   rotate right:   ((a b) c)  →  (a (b c))
//!   rotate left:    (a (b c))  →  ((a b) c)
//!   swap:           (a b)      →  (b a)
//! ```
//!
//! An edit builds the new internal nodes in the [`VtreeStore`] and re-creates
//! every ancestor of the edit point on top of them. Subtrees `a`, `b`, `c` and
//! everything outside the edited path keep their ids.

use std::collections::HashMap;
use std::fmt::{self, Display};

use log::debug;

use crate::vtree::{VtreeId, VtreeNode, VtreeRoot, VtreeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VtreeOperation {
    /// `(a (b c)) → ((a b) c)` at a right fragment.
    RotateLeft(VtreeId),
    /// `((a b) c) → (a (b c))` at a left fragment.
    RotateRight(VtreeId),
    /// `(a b) → (b a)` at an internal node.
    Swap(VtreeId),
}

impl VtreeOperation {
    pub fn target(self) -> VtreeId {
        match self {
            VtreeOperation::RotateLeft(v) | VtreeOperation::RotateRight(v) | VtreeOperation::Swap(v) => v,
        }
    }
}

impl Display for VtreeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VtreeOperation::RotateLeft(v) => write!(f, "rotate-left({})", v),
            VtreeOperation::RotateRight(v) => write!(f, "rotate-right({})", v),
            VtreeOperation::Swap(v) => write!(f, "swap({})", v),
        }
    }
}

/// Result of a structural edit.
#[derive(Debug, Clone)]
pub struct VtreeEdit {
    pub operation: VtreeOperation,
    /// Root of the edited tree.
    pub root: VtreeId,
    /// The node that took the place of the edit point.
    pub edited: VtreeId,
    /// Old → new ids for the edit point and each of its ancestors.
    pub replaced: HashMap<VtreeId, VtreeId>,
    /// The inner fragment node that has no counterpart after a rotation.
    pub dissolved: Option<VtreeId>,
}

impl VtreeStore {
    /// Applies `operation` to `vtree`.
    ///
    /// # Panics
    ///
    /// Panics if a rotation target is not the matching fragment, or if a swap
    /// target is a leaf.
    pub fn restructure(&mut self, vtree: &VtreeRoot, operation: VtreeOperation) -> VtreeEdit {
        let v = operation.target();
        let (edited, dissolved) = match operation {
            VtreeOperation::RotateRight(_) => {
                assert!(vtree.is_left_fragment(v), "Cannot rotate right at {}: not a left fragment", v);
                let x = vtree.left(v);
                let (a, b, c) = (vtree.left(x), vtree.right(x), vtree.right(v));
                let bc = self.internal(b, c);
                (self.internal(a, bc), Some(x))
            }
            VtreeOperation::RotateLeft(_) => {
                assert!(vtree.is_right_fragment(v), "Cannot rotate left at {}: not a right fragment", v);
                let y = vtree.right(v);
                let (a, b, c) = (vtree.left(v), vtree.left(y), vtree.right(y));
                let ab = self.internal(a, b);
                (self.internal(ab, c), Some(y))
            }
            VtreeOperation::Swap(_) => {
                assert!(!vtree.is_leaf(v), "Cannot swap the children of leaf {}", v);
                (self.internal(vtree.right(v), vtree.left(v)), None)
            }
        };
        debug!("restructure: {} rebuilt {} as {}", operation, v, edited);

        let mut replaced = HashMap::new();
        replaced.insert(v, edited);
        let mut old_child = v;
        let mut new_child = edited;
        while let Some(parent) = vtree.parent(old_child) {
            let rebuilt = match vtree.node(parent) {
                VtreeNode::Internal(left, right) if left == old_child => self.internal(new_child, right),
                VtreeNode::Internal(left, _) => self.internal(left, new_child),
                VtreeNode::Leaf(_) => unreachable!("a parent is always internal"),
            };
            replaced.insert(parent, rebuilt);
            old_child = parent;
            new_child = rebuilt;
        }

        VtreeEdit {
            operation,
            root: new_child,
            edited,
            replaced,
            dissolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn shape(store: &VtreeStore, root: VtreeId) -> String {
        VtreeRoot::new(store, root).to_shape_string()
    }

    #[test]
    fn test_rotate_right_then_left() {
        let mut store = VtreeStore::new();
        let root = store.parse("(4 ((1 2) 3))").unwrap();
        let vtree = VtreeRoot::new(&store, root);
        let v = vtree.right(root);

        let edit = store.restructure(&vtree, VtreeOperation::RotateRight(v));
        assert_eq!(shape(&store, edit.root), "(x4 (x1 (x2 x3)))");
        assert_eq!(edit.dissolved, Some(vtree.left(v)));
        assert_eq!(edit.replaced.len(), 2);
        assert_eq!(edit.replaced[&v], edit.edited);

        let rotated = VtreeRoot::new(&store, edit.root);
        let back = store.restructure(&rotated, VtreeOperation::RotateLeft(edit.edited));
        assert_eq!(back.root, root, "hash-consing restores the original ids");
        assert_eq!(back.edited, v);
    }

    #[test]
    fn test_swap_is_involution() {
        let mut store = VtreeStore::new();
        let root = store.parse("((1 2) (3 4))").unwrap();
        let vtree = VtreeRoot::new(&store, root);
        let edit = store.restructure(&vtree, VtreeOperation::Swap(vtree.left(root)));
        assert_eq!(shape(&store, edit.root), "((x2 x1) (x3 x4))");
        assert_eq!(edit.dissolved, None);
        let swapped = VtreeRoot::new(&store, edit.root);
        let back = store.restructure(&swapped, VtreeOperation::Swap(edit.edited));
        assert_eq!(back.root, root);
    }

    #[test]
    #[should_panic(expected = "not a left fragment")]
    fn test_rotate_right_non_fragment() {
        let mut store = VtreeStore::new();
        let root = store.parse("(1 (2 3))").unwrap();
        let vtree = VtreeRoot::new(&store, root);
        store.restructure(&vtree, VtreeOperation::RotateRight(root));
    }

    #[test]
    #[should_panic(expected = "leaf")]
    fn test_swap_leaf() {
        let mut store = VtreeStore::new();
        let root = store.parse("(1 2)").unwrap();
        let vtree = VtreeRoot::new(&store, root);
        store.restructure(&vtree, VtreeOperation::Swap(vtree.left(root)));
    }
}
