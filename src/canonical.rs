//! Compression and trimming of element sets.
//!
//! A partition is *compressed* when its subs are distinct, and *trimmed* when
//! it is neither `{(⊤, α)}` nor `{(α, ⊤), (¬α, ⊥)}`. Each element set built
//! by apply and by the vtree transformations passes through here before it
//! becomes a node, which keeps every node canonical.

use crate::handler::{Cancelable, ComputationHandler};
use crate::node::Element;
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Op;
use crate::vtree::VtreeId;

/// Outcome of [`Sdd::compress_and_trim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Canonical {
    /// The partition trimmed down to an existing node.
    Node(Ref),
    /// A compressed partition, sorted by sub, of at least two elements.
    Elements(Vec<Element>),
}

impl Sdd {
    /// Merges elements with equal subs by disjoining their primes.
    ///
    /// Returns the elements sorted by sub.
    pub(crate) fn compress(
        &self,
        mut elements: Vec<Element>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Vec<Element>> {
        elements.retain(|e| !e.prime.is_false());
        elements.sort_unstable();

        let mut compressed: Vec<Element> = Vec::with_capacity(elements.len());
        for e in elements {
            match compressed.last_mut() {
                Some(last) if last.sub == e.sub => {
                    last.prime = self.apply_rec(last.prime, e.prime, Op::Or, handler)?;
                }
                _ => compressed.push(e),
            }
        }
        Ok(compressed)
    }

    pub(crate) fn compress_and_trim(
        &self,
        mut elements: Vec<Element>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Canonical> {
        elements.retain(|e| !e.prime.is_false());
        elements.sort_unstable();

        let (first, last) = match (elements.first(), elements.last()) {
            (Some(first), Some(last)) => (first.sub, last.sub),
            _ => return Ok(Canonical::Node(Ref::FALSE)),
        };

        // {(⊤, α)} after compression
        if first == last {
            return Ok(Canonical::Node(first));
        }

        // {(α, ⊤), (¬α, ⊥)} after compression: the node is α
        if first == Ref::FALSE && last == Ref::TRUE {
            let mut alpha = Ref::FALSE;
            for e in elements.iter().filter(|e| e.sub.is_true()) {
                alpha = self.apply_rec(alpha, e.prime, Op::Or, handler)?;
            }
            return Ok(Canonical::Node(alpha));
        }

        Ok(Canonical::Elements(self.compress(elements, handler)?))
    }

    /// Canonicalizes `elements` and returns the resulting node at `vtree`.
    pub(crate) fn canonical_node(
        &self,
        vtree: VtreeId,
        elements: Vec<Element>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        Ok(match self.compress_and_trim(elements, handler)? {
            Canonical::Node(f) => f,
            Canonical::Elements(elements) => self.make_decomposition(vtree, elements),
        })
    }
}
