//! Translating SDD nodes across vtree rotations and swaps.
//!
//! After an edit of the vtree at node `v`, every node falls in one of these
//! groups, see [`Action`]:
//!
//! - nodes normalized away from `v` and its ancestors are kept as they are;
//! - nodes at a strict ancestor `u` of `v` are rebuilt at the new `u` after
//!   translating the side (primes or subs) that contains `v`;
//! - nodes at `v` itself are re-partitioned for the new shape;
//! - nodes at the inner fragment node that vanishes in a rotation keep their
//!   elements and move to the new node at the edit point.
//!
//! Re-partitioning works element by element: each element `(P, S)` of a node
//! at `v` is classified by where `P` and `S` live relative to the fragment,
//! and expanded into a partition for the new shape.
//!
//! ```text
//! rotate right   ((a b) c) → (a (b c)),  x = (a b)
//!   S = ⊥                  nothing
//!   P at x = {(a_j, b_j)}  {(a_j, b_j ∧ S)}
//!   P in a                 {(P, S), (¬P, ⊥)}
//!   P in b                 {(⊤, P ∧ S)}
//!
//! rotate left    (a (b c)) → ((a b) c),  y = (b c)
//!   S at y = {(b_j, c_j)}  {(P ∧ b_j, c_j)}
//!   S in b                 {(P ∧ S, ⊤), (P ∧ ¬S, ⊥)}
//!   S in c, S = ⊤, S = ⊥   {(P, S)}
//!
//! swap           (a b) → (b a)
//!   S = ⊥                  nothing
//!   S = ⊤                  {(⊤, P)}
//!   otherwise              {(S, P), (¬S, ⊥)}
//! ```
//!
//! Expansions of a rotated-right or swapped node are combined by a
//! disjunctive cartesian product; those of a rotated-left node already form
//! a partition together.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::handler::{check, Cancelable, ComputationEvent, ComputationHandler};
use crate::node::{Element, SddNode};
use crate::reference::Ref;
use crate::restructure::{VtreeEdit, VtreeOperation};
use crate::sdd::{Sdd, VtreeShadow};
use crate::types::Op;
use crate::vtree::{VtreeId, VtreeRoot};

/// Maps nodes valid before a sequence of vtree edits to their equivalents
/// under the resulting vtree.
#[derive(Debug, Clone)]
pub struct TransformationResult {
    translations: HashMap<Ref, Ref>,
    vtree: Rc<VtreeRoot>,
}

impl TransformationResult {
    /// No edits: every node maps to itself.
    pub fn identity(vtree: Rc<VtreeRoot>) -> Self {
        Self {
            translations: HashMap::new(),
            vtree,
        }
    }

    pub(crate) fn new(translations: HashMap<Ref, Ref>, vtree: Rc<VtreeRoot>) -> Self {
        Self { translations, vtree }
    }

    /// The vtree the translated nodes are valid under.
    pub fn vtree(&self) -> &Rc<VtreeRoot> {
        &self.vtree
    }

    /// The translation of `f`. Nodes not recorded map to themselves.
    pub fn translate(&self, f: Ref) -> Ref {
        self.translations.get(&f).copied().unwrap_or(f)
    }

    pub fn translate_all(&self, roots: &[Ref]) -> Vec<Ref> {
        roots.iter().map(|&f| self.translate(f)).collect()
    }

    pub fn translations(&self) -> &HashMap<Ref, Ref> {
        &self.translations
    }

    /// Composes `self` with a result computed afterwards.
    pub fn collapse(&self, next: &TransformationResult) -> TransformationResult {
        let mut translations: HashMap<Ref, Ref> = next.translations.clone();
        for (&from, &to) in &self.translations {
            translations.insert(from, next.translate(to));
        }
        translations.retain(|from, to| from != to);
        TransformationResult {
            translations,
            vtree: Rc::clone(&next.vtree),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateRightCase {
    SubFalse,
    /// The prime is normalized at the inner node `x`, the sub is ⊤.
    SplitPrime,
    SplitPrimeAndSub,
    PrimeInA,
    PrimeInASubTrue,
    PrimeInB,
    PrimeInBSubTrue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateLeftCase {
    /// The sub is normalized at the inner node `y`.
    SplitSub,
    SubInB,
    /// Sub in `c` or constant: the element carries over.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapCase {
    SubFalse,
    SubTrue,
    Flip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionCases {
    RotateRight(Vec<RotateRightCase>),
    RotateLeft(Vec<RotateLeftCase>),
    Swap(Vec<SwapCase>),
}

/// What a vtree edit does to a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Keep,
    /// The edit point lies in the left subtree: translate the primes.
    DescendPrime,
    /// The edit point lies in the right subtree: translate the subs.
    DescendSub,
    /// The node is normalized at the edit point.
    Partition(PartitionCases),
    /// The node is normalized at the vanished fragment node.
    Reregister,
}

/// A vtree edit that has been pushed, together with the vtree before it.
pub(crate) struct TransformContext {
    pub edit: VtreeEdit,
    pub old: Rc<VtreeRoot>,
}

impl TransformContext {
    fn target(&self) -> VtreeId {
        self.edit.operation.target()
    }
}

impl Sdd {
    /// Decides what the edit in `ctx` does to `f`.
    pub(crate) fn classify(&self, ctx: &TransformContext, f: Ref) -> Action {
        let (v, elements) = match self.node(f) {
            SddNode::Decomposition { vtree, elements } => (vtree, elements),
            _ => return Action::Keep,
        };
        let target = ctx.target();
        if v == target {
            return Action::Partition(self.partition_cases(ctx, &elements));
        }
        if ctx.edit.dissolved == Some(v) {
            return Action::Reregister;
        }
        if ctx.edit.replaced.contains_key(&v) {
            return if ctx.old.is_in_left(target, v) {
                Action::DescendPrime
            } else {
                Action::DescendSub
            };
        }
        Action::Keep
    }

    fn partition_cases(&self, ctx: &TransformContext, elements: &[Element]) -> PartitionCases {
        let old = &ctx.old;
        let v = ctx.target();
        let located = |f: Ref, region: VtreeId| self.anchor(f).is_some_and(|a| old.is_subtree(a, region));
        match ctx.edit.operation {
            VtreeOperation::RotateRight(_) => {
                let x = old.left(v);
                let a = old.left(x);
                let cases = elements
                    .iter()
                    .map(|e| {
                        let sub_true = e.sub.is_true();
                        if e.sub.is_false() {
                            RotateRightCase::SubFalse
                        } else if self.anchor(e.prime) == Some(x) {
                            if sub_true {
                                RotateRightCase::SplitPrime
                            } else {
                                RotateRightCase::SplitPrimeAndSub
                            }
                        } else if located(e.prime, a) {
                            if sub_true {
                                RotateRightCase::PrimeInASubTrue
                            } else {
                                RotateRightCase::PrimeInA
                            }
                        } else if sub_true {
                            RotateRightCase::PrimeInBSubTrue
                        } else {
                            RotateRightCase::PrimeInB
                        }
                    })
                    .collect();
                PartitionCases::RotateRight(cases)
            }
            VtreeOperation::RotateLeft(_) => {
                let y = old.right(v);
                let b = old.left(y);
                let cases = elements
                    .iter()
                    .map(|e| {
                        if self.anchor(e.sub) == Some(y) {
                            RotateLeftCase::SplitSub
                        } else if located(e.sub, b) {
                            RotateLeftCase::SubInB
                        } else {
                            RotateLeftCase::Unchanged
                        }
                    })
                    .collect();
                PartitionCases::RotateLeft(cases)
            }
            VtreeOperation::Swap(_) => {
                let cases = elements
                    .iter()
                    .map(|e| {
                        if e.sub.is_false() {
                            SwapCase::SubFalse
                        } else if e.sub.is_true() {
                            SwapCase::SubTrue
                        } else {
                            SwapCase::Flip
                        }
                    })
                    .collect();
                PartitionCases::Swap(cases)
            }
        }
    }

    /// Re-partitions a node normalized at the edit point for the new vtree.
    pub(crate) fn partition(
        &self,
        ctx: &TransformContext,
        f: Ref,
        cases: &PartitionCases,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let elements = self.elements(f);
        let w = ctx.edit.edited;
        let compress = self.config().cartesian_compression;
        match cases {
            PartitionCases::RotateRight(cases) => {
                let mut sets = Vec::with_capacity(elements.len());
                for (e, case) in elements.iter().zip(cases) {
                    let (p, s) = (e.prime, e.sub);
                    let set = match case {
                        RotateRightCase::SubFalse => continue,
                        RotateRightCase::SplitPrime => self.elements(p).to_vec(),
                        RotateRightCase::SplitPrimeAndSub => {
                            let mut set = Vec::new();
                            for inner in self.elements(p).iter() {
                                set.push(Element::new(inner.prime, self.apply_rec(inner.sub, s, Op::And, handler)?));
                            }
                            set
                        }
                        RotateRightCase::PrimeInA => vec![Element::new(p, s), Element::new(self.negate(p), Ref::FALSE)],
                        RotateRightCase::PrimeInASubTrue => {
                            vec![Element::new(p, Ref::TRUE), Element::new(self.negate(p), Ref::FALSE)]
                        }
                        RotateRightCase::PrimeInB => vec![Element::new(Ref::TRUE, self.apply_rec(p, s, Op::And, handler)?)],
                        RotateRightCase::PrimeInBSubTrue => vec![Element::new(Ref::TRUE, p)],
                    };
                    sets.push(set);
                }
                let product = self.cartesian_product(sets, compress, handler)?;
                self.canonical_node(w, product, handler)
            }
            PartitionCases::RotateLeft(cases) => {
                let mut partition = Vec::with_capacity(elements.len());
                for (e, case) in elements.iter().zip(cases) {
                    let (p, s) = (e.prime, e.sub);
                    match case {
                        RotateLeftCase::SplitSub => {
                            for inner in self.elements(s).iter() {
                                let prime = self.apply_rec(p, inner.prime, Op::And, handler)?;
                                partition.push(Element::new(prime, inner.sub));
                            }
                        }
                        RotateLeftCase::SubInB => {
                            let with = self.apply_rec(p, s, Op::And, handler)?;
                            let without = self.apply_rec(p, self.negate(s), Op::And, handler)?;
                            partition.push(Element::new(with, Ref::TRUE));
                            partition.push(Element::new(without, Ref::FALSE));
                        }
                        RotateLeftCase::Unchanged => partition.push(*e),
                    }
                }
                self.canonical_node(w, partition, handler)
            }
            PartitionCases::Swap(cases) => {
                let mut sets = Vec::with_capacity(elements.len());
                for (e, case) in elements.iter().zip(cases) {
                    let (p, s) = (e.prime, e.sub);
                    let set = match case {
                        SwapCase::SubFalse => continue,
                        SwapCase::SubTrue => vec![Element::new(Ref::TRUE, p)],
                        SwapCase::Flip => vec![Element::new(s, p), Element::new(self.negate(s), Ref::FALSE)],
                    };
                    sets.push(set);
                }
                let product = self.cartesian_product(sets, compress, handler)?;
                self.canonical_node(w, product, handler)
            }
        }
    }

    /// Moves a node from the vanished fragment node to the edit point.
    pub(crate) fn reregister(&self, ctx: &TransformContext, f: Ref) -> Ref {
        self.make_decomposition(ctx.edit.edited, self.elements(f).to_vec())
    }

    /// Rebuilds an ancestor node of the edit point from translated elements.
    pub(crate) fn rebuild_ancestor(&self, ctx: &TransformContext, f: Ref, elements: Vec<Element>) -> Ref {
        let v = match self.anchor(f) {
            Some(v) => v,
            None => unreachable!("only decompositions are rebuilt"),
        };
        self.make_decomposition(ctx.edit.replaced[&v], elements)
    }

    /// Pushes the edited vtree, keeping the previous one for classification.
    pub(crate) fn begin_transformation(
        &self,
        operation: VtreeOperation,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(TransformContext, VtreeShadow<'_>)> {
        check(handler, ComputationEvent::SddTransformation)?;
        let old = self.vtree();
        let shadow = self.speculate();
        let edit = self.push_restructured(operation);
        debug!("{}: {} → {}", operation, old, self.vtree());
        Ok((TransformContext { edit, old }, shadow))
    }
}

// Single-node transformations.
impl Sdd {
    /// Rotates the vtree right at `v` and translates `f`.
    ///
    /// The new vtree stays on the stack for as long as the returned shadow
    /// lives, or for good once the shadow is committed.
    pub fn rotate_right(
        &self,
        f: Ref,
        v: VtreeId,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(Ref, VtreeShadow<'_>)> {
        self.transform_node(f, VtreeOperation::RotateRight(v), handler)
    }

    /// Rotates the vtree left at `v` and translates `f`.
    pub fn rotate_left(
        &self,
        f: Ref,
        v: VtreeId,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(Ref, VtreeShadow<'_>)> {
        self.transform_node(f, VtreeOperation::RotateLeft(v), handler)
    }

    /// Swaps the children of `v` and translates `f`.
    pub fn swap(&self, f: Ref, v: VtreeId, handler: &mut dyn ComputationHandler) -> Cancelable<(Ref, VtreeShadow<'_>)> {
        self.transform_node(f, VtreeOperation::Swap(v), handler)
    }

    fn transform_node(
        &self,
        f: Ref,
        operation: VtreeOperation,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(Ref, VtreeShadow<'_>)> {
        check(handler, ComputationEvent::ComputationStarted)?;
        let (ctx, shadow) = self.begin_transformation(operation, handler)?;
        let mut cache = HashMap::new();
        let g = self.translate_rec(&ctx, f, &mut cache, handler)?;
        Ok((g, shadow))
    }

    fn translate_rec(
        &self,
        ctx: &TransformContext,
        f: Ref,
        cache: &mut HashMap<Ref, Ref>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        if f.is_trivial() {
            return Ok(f);
        }
        if let Some(&g) = cache.get(&f) {
            return Ok(g);
        }
        let g = match self.classify(ctx, f) {
            Action::Keep => f,
            Action::Reregister => self.reregister(ctx, f),
            Action::Partition(cases) => self.partition(ctx, f, &cases, handler)?,
            Action::DescendPrime => {
                let mut elements = Vec::new();
                for e in self.elements(f).iter() {
                    elements.push(Element::new(self.translate_rec(ctx, e.prime, cache, handler)?, e.sub));
                }
                self.rebuild_ancestor(ctx, f, elements)
            }
            Action::DescendSub => {
                let mut elements = Vec::new();
                for e in self.elements(f).iter() {
                    elements.push(Element::new(e.prime, self.translate_rec(ctx, e.sub, cache, handler)?));
                }
                self.rebuild_ancestor(ctx, f, elements)
            }
        };
        cache.insert(f, g);
        Ok(g)
    }
}
