//! Vtree fragments: a node together with one internal child.
//!
//! A fragment over three subtrees `a`, `b`, `c` has twelve shapes, two per
//! ordering of the subtrees. Alternating rotations of the fragment root with
//! swaps of its inner child visits all of them:
//!
//! ```text
//! left-linear  ((a b) c):  r s l s r s l s r s l s
//! right-linear (a (b c)):  l s r s l s r s l s r s
//! ```
//!
//! The twelfth move leads back to the initial shape, so eleven moves suffice
//! to visit every state. Every move pushes one vtree, which makes state `k`
//! live at stack depth `base + k`.

use log::debug;

use crate::handler::{Cancelable, ComputationHandler};
use crate::reference::Ref;
use crate::restructure::VtreeOperation;
use crate::sdd::Sdd;
use crate::transform::TransformationResult;
use crate::vtree::VtreeId;

pub const NUM_FRAGMENT_STATES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// `((a b) c)`: the inner child is on the left.
    Left,
    /// `(a (b c))`: the inner child is on the right.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    RotateRight,
    RotateLeft,
    SwapChild,
}

use Move::{RotateLeft as L, RotateRight as R, SwapChild as S};

const LEFT_LINEAR_MOVES: [Move; NUM_FRAGMENT_STATES] = [R, S, L, S, R, S, L, S, R, S, L, S];
const RIGHT_LINEAR_MOVES: [Move; NUM_FRAGMENT_STATES] = [L, S, R, S, L, S, R, S, L, S, R, S];

#[derive(Debug, Clone)]
struct FragmentState {
    root: VtreeId,
    inner_left: bool,
    roots: Vec<Ref>,
    /// Translation from the initial state to this one.
    result: TransformationResult,
    size: usize,
}

pub struct VtreeFragment<'a> {
    sdd: &'a Sdd,
    kind: FragmentKind,
    base_depth: usize,
    states: Vec<FragmentState>,
}

impl<'a> VtreeFragment<'a> {
    /// Starts a fragment at `root` of the current vtree, tracking `roots`.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a fragment of the given kind.
    pub fn new(sdd: &'a Sdd, root: VtreeId, kind: FragmentKind, roots: Vec<Ref>) -> Self {
        let vtree = sdd.vtree();
        let inner_left = match kind {
            FragmentKind::Left => {
                assert!(vtree.is_left_fragment(root), "{} is not a left fragment", root);
                true
            }
            FragmentKind::Right => {
                assert!(vtree.is_right_fragment(root), "{} is not a right fragment", root);
                false
            }
        };
        let size = sdd.size(&roots);
        let initial = FragmentState {
            root,
            inner_left,
            roots,
            result: TransformationResult::identity(vtree),
            size,
        };
        Self {
            sdd,
            kind,
            base_depth: sdd.vtree_depth(),
            states: vec![initial],
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Index of the current state, `0` being the initial one.
    pub fn state(&self) -> usize {
        self.states.len() - 1
    }

    fn current(&self) -> &FragmentState {
        match self.states.last() {
            Some(state) => state,
            None => unreachable!("the initial state is never popped"),
        }
    }

    pub fn has_next(&self) -> bool {
        self.state() + 1 < NUM_FRAGMENT_STATES
    }

    /// The fragment root in the current state.
    pub fn root(&self) -> VtreeId {
        self.current().root
    }

    /// Total size of the tracked roots in the current state.
    pub fn size(&self) -> usize {
        self.current().size
    }

    pub fn size_at(&self, index: usize) -> usize {
        self.states[index].size
    }

    /// The tracked roots, translated to the current state.
    pub fn roots(&self) -> &[Ref] {
        &self.current().roots
    }

    /// Translation from the initial state to the current one.
    pub fn result(&self) -> &TransformationResult {
        &self.current().result
    }

    fn moves(&self) -> &'static [Move; NUM_FRAGMENT_STATES] {
        match self.kind {
            FragmentKind::Left => &LEFT_LINEAR_MOVES,
            FragmentKind::Right => &RIGHT_LINEAR_MOVES,
        }
    }

    /// Moves to the next state and returns its size.
    ///
    /// On cancellation the fragment stays in its current state.
    pub fn next(&mut self, handler: &mut dyn ComputationHandler) -> Cancelable<usize> {
        assert!(self.has_next(), "All fragment states were visited");
        debug_assert_eq!(self.sdd.vtree_depth(), self.base_depth + self.state());

        let current = self.current();
        let vtree = self.sdd.vtree();
        let mv = self.moves()[self.state()];
        let operation = match mv {
            Move::RotateRight => VtreeOperation::RotateRight(current.root),
            Move::RotateLeft => VtreeOperation::RotateLeft(current.root),
            Move::SwapChild if current.inner_left => VtreeOperation::Swap(vtree.left(current.root)),
            Move::SwapChild => VtreeOperation::Swap(vtree.right(current.root)),
        };

        let (step, edit, shadow) = self.sdd.transform_edit(&current.roots, operation, handler)?;
        shadow.commit();

        let (root, inner_left) = match mv {
            Move::RotateRight => (edit.edited, false),
            Move::RotateLeft => (edit.edited, true),
            Move::SwapChild => (edit.replaced[&current.root], current.inner_left),
        };
        let roots = step.translate_all(&current.roots);
        let size = self.sdd.size(&roots);
        let result = current.result.collapse(&step);
        debug!(
            "fragment {:?} state {} → {}: {}, size {}",
            self.kind,
            self.state(),
            self.state() + 1,
            operation,
            size
        );
        self.states.push(FragmentState {
            root,
            inner_left,
            roots,
            result,
            size,
        });
        Ok(size)
    }

    /// Returns to an earlier state, popping the vtrees pushed after it.
    pub fn rollback(&mut self, index: usize) {
        assert!(index <= self.state(), "Cannot roll back to future state {}", index);
        self.sdd.truncate_vtree_stack(self.base_depth + index);
        self.states.truncate(index + 1);
    }

    /// Moves to state `index`, rolling back or replaying moves as needed.
    pub fn goto(&mut self, index: usize, handler: &mut dyn ComputationHandler) -> Cancelable<()> {
        assert!(index < NUM_FRAGMENT_STATES, "A fragment has only {} states", NUM_FRAGMENT_STATES);
        if index <= self.state() {
            self.rollback(index);
        }
        while self.state() < index {
            self.next(handler)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_log::test;

    use super::*;
    use crate::eval::Assignment;
    use crate::handler::NopHandler;

    #[test]
    fn test_visits_twelve_distinct_shapes() {
        let sdd = Sdd::parse_vtree("((1 2) 3)").unwrap();
        let f = sdd.or(sdd.cube([1, -2]), sdd.cube([2, 3]));
        let root = sdd.vtree().root();
        let mut fragment = VtreeFragment::new(&sdd, root, FragmentKind::Left, vec![f]);

        let mut shapes = HashSet::new();
        shapes.insert(sdd.vtree().to_shape_string());
        while fragment.has_next() {
            fragment.next(&mut NopHandler).unwrap();
            assert_eq!(sdd.vtree().root(), fragment.root());
            shapes.insert(sdd.vtree().to_shape_string());

            let g = fragment.roots()[0];
            assert_eq!(fragment.result().translate(f), g);
            for bits in 0..8i32 {
                let a: Assignment = (1..=3).map(|i| if bits & (1 << (i - 1)) != 0 { i } else { -i }).collect();
                assert_eq!(sdd.evaluate(f, &a), sdd.evaluate(g, &a));
            }
        }
        assert_eq!(fragment.state(), 11);
        assert_eq!(shapes.len(), NUM_FRAGMENT_STATES);
        assert_eq!(sdd.vtree_depth(), 12);
    }

    #[test]
    fn test_rollback_and_goto() {
        let sdd = Sdd::parse_vtree("(1 (2 (3 4)))").unwrap();
        let f = sdd.or(sdd.cube([1, 4]), sdd.cube([2, -3]));
        let v = sdd.vtree().right(sdd.vtree().root());
        let mut fragment = VtreeFragment::new(&sdd, v, FragmentKind::Right, vec![f]);
        let initial_size = fragment.size();

        fragment.goto(5, &mut NopHandler).unwrap();
        let shape_at_5 = sdd.vtree().to_shape_string();
        let size_at_5 = fragment.size();
        assert_eq!(sdd.vtree_depth(), 6);

        fragment.rollback(0);
        assert_eq!(sdd.vtree_depth(), 1);
        assert_eq!(sdd.vtree().to_shape_string(), "(x1 (x2 (x3 x4)))");
        assert_eq!(fragment.size(), initial_size);
        assert_eq!(fragment.roots(), &[f]);

        fragment.goto(5, &mut NopHandler).unwrap();
        assert_eq!(sdd.vtree().to_shape_string(), shape_at_5);
        assert_eq!(fragment.size_at(5), size_at_5);
    }

    #[test]
    #[should_panic(expected = "not a left fragment")]
    fn test_wrong_kind() {
        let sdd = Sdd::parse_vtree("(1 (2 3))").unwrap();
        let root = sdd.vtree().root();
        VtreeFragment::new(&sdd, root, FragmentKind::Left, vec![]);
    }
}
