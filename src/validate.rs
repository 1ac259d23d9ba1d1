//! Structural checks of SDD nodes against the current vtree.

use crate::node::{Element, SddNode};
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Op;

impl Sdd {
    /// Every node reachable from `f` is normalized for a node of the current
    /// vtree, with primes in the left and subs in the right subtree.
    pub fn valid_vtree(&self, f: Ref) -> bool {
        let vtree = self.vtree();
        self.descendants(&[f]).into_iter().all(|g| match self.node(g) {
            SddNode::Trivial(_) => true,
            SddNode::Literal { var, .. } => vtree.leaf(var).is_some(),
            SddNode::Decomposition { vtree: v, elements } => {
                if !vtree.contains(v) || vtree.is_leaf(v) {
                    return false;
                }
                elements.iter().all(|e| {
                    let prime_ok = self.anchor(e.prime).map_or(true, |a| vtree.contains(a) && vtree.is_in_left(a, v));
                    let sub_ok = self.anchor(e.sub).map_or(true, |a| vtree.contains(a) && vtree.is_in_right(a, v));
                    prime_ok && sub_ok
                })
            }
        })
    }

    /// Subs are pairwise distinct.
    pub fn is_compressed(&self, elements: &[Element]) -> bool {
        let mut subs: Vec<Ref> = elements.iter().map(|e| e.sub).collect();
        subs.sort_unstable();
        subs.windows(2).all(|w| w[0] != w[1])
    }

    /// Neither `{(⊤, α)}` nor `{(α, ⊤), (¬α, ⊥)}`.
    pub fn is_trimmed(&self, elements: &[Element]) -> bool {
        match elements {
            [e] => !e.prime.is_true(),
            [a, b] => {
                let subs_are_constants = (a.sub.is_true() && b.sub.is_false()) || (a.sub.is_false() && b.sub.is_true());
                !subs_are_constants
            }
            _ => true,
        }
    }

    /// Primes are consistent, pairwise disjoint and exhaustive.
    ///
    /// The meets and joins this takes are left out of [`stats`][Sdd::stats].
    pub fn is_partition(&self, elements: &[Element]) -> bool {
        if elements.iter().any(|e| e.prime.is_false()) {
            return false;
        }
        self.unrecorded(|| {
            let disjoint = elements.iter().enumerate().all(|(i, a)| {
                elements[i + 1..]
                    .iter()
                    .all(|b| self.apply(a.prime, b.prime, Op::And).is_false())
            });
            disjoint
                && elements
                    .iter()
                    .fold(Ref::FALSE, |acc, e| self.apply(acc, e.prime, Op::Or))
                    .is_true()
        })
    }

    /// Every decomposition reachable from `f` is a sorted, compressed and
    /// trimmed partition respecting the current vtree.
    pub fn is_canonical(&self, f: Ref) -> bool {
        if !self.valid_vtree(f) {
            return false;
        }
        self.descendants(&[f]).into_iter().all(|g| {
            let elements = self.elements(g);
            if elements.is_empty() {
                return true;
            }
            elements.windows(2).all(|w| w[0] < w[1])
                && self.is_compressed(&elements)
                && self.is_trimmed(&elements)
                && self.is_partition(&elements)
        })
    }
}
