//! Apply and the connectives built on it.

use log::trace;

use crate::cache::ApplyKey;
use crate::handler::{check, uncancelable, Cancelable, ComputationEvent, ComputationHandler, NopHandler};
use crate::node::Element;
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::{Op, Var};
use crate::vtree::VtreeId;

impl Sdd {
    /// Conjunction or disjunction of `f` and `g` under the current vtree.
    pub fn apply(&self, f: Ref, g: Ref, op: Op) -> Ref {
        uncancelable(self.apply_rec(f, g, op, &mut NopHandler))
    }

    /// Like [`apply`][Sdd::apply], polling `handler` on every cache miss.
    ///
    /// On cancellation nothing is written to the apply cache for the
    /// unfinished calls; finished subcalls stay cached.
    pub fn apply_with(&self, f: Ref, g: Ref, op: Op, handler: &mut dyn ComputationHandler) -> Cancelable<Ref> {
        check(handler, ComputationEvent::ComputationStarted)?;
        self.apply_rec(f, g, op, handler)
    }

    pub(crate) fn apply_rec(
        &self,
        f: Ref,
        g: Ref,
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        if f == g {
            return Ok(f);
        }
        if self.known_negation(f) == Some(g) {
            return Ok(op.zero());
        }
        if f == op.zero() || g == op.zero() {
            return Ok(op.zero());
        }
        if f == op.one() {
            return Ok(g);
        }
        if g == op.one() {
            return Ok(f);
        }

        let vtree = self.vtree();
        let (vf, vg) = match (self.anchor(f), self.anchor(g)) {
            (Some(vf), Some(vg)) => (vf, vg),
            _ => unreachable!("constants are handled above"),
        };
        // Order the operands so that f comes first in the vtree in-order.
        let (f, g, vf, vg) = if vtree.position(vf) <= vtree.position(vg) {
            (f, g, vf, vg)
        } else {
            (g, f, vg, vf)
        };

        let key = ApplyKey::new(op, f, g);
        if let Some(result) = self.cache_lookup(&key) {
            return Ok(result);
        }
        check(handler, ComputationEvent::SddApply)?;

        let result = if vf == vg {
            let left = self.elements(f);
            let right = self.elements(g);
            let elements = self.multiply(&left, &right, op, handler)?;
            self.canonical_node(vf, elements, handler)?
        } else {
            let lca = vtree.lca(vf, vg);
            if lca == vg {
                self.apply_left(f, g, vg, op, handler)?
            } else if lca == vf {
                self.apply_right(f, g, vf, op, handler)?
            } else {
                self.apply_incomparable(f, g, lca, op, handler)?
            }
        };
        trace!("apply({}, {}, {}) = {}", op, f, g, result);

        self.cache_store(key, result);
        Ok(result)
    }

    /// `f` lies in the left subtree of `v`, the anchor of `g`.
    fn apply_left(
        &self,
        f: Ref,
        g: Ref,
        v: VtreeId,
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        // f is expanded at v as {(n, op.one()), (¬n, op.zero())}
        let n = match op {
            Op::And => f,
            Op::Or => self.negate(f),
        };
        let mut elements = Vec::new();
        elements.push(Element::new(self.negate(n), op.zero()));
        for e in self.elements(g).iter() {
            let prime = self.apply_rec(e.prime, n, Op::And, handler)?;
            if !prime.is_false() {
                elements.push(Element::new(prime, e.sub));
            }
        }
        self.canonical_node(v, elements, handler)
    }

    /// `g` lies in the right subtree of `v`, the anchor of `f`.
    fn apply_right(
        &self,
        f: Ref,
        g: Ref,
        v: VtreeId,
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let mut elements = Vec::new();
        for e in self.elements(f).iter() {
            elements.push(Element::new(e.prime, self.apply_rec(e.sub, g, op, handler)?));
        }
        self.canonical_node(v, elements, handler)
    }

    /// `f` lies in the left and `g` in the right subtree of `v`.
    fn apply_incomparable(
        &self,
        f: Ref,
        g: Ref,
        v: VtreeId,
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let not_f = self.negate(f);
        let elements = match op {
            Op::And => vec![Element::new(f, g), Element::new(not_f, Ref::FALSE)],
            Op::Or => vec![Element::new(f, Ref::TRUE), Element::new(not_f, g)],
        };
        self.canonical_node(v, elements, handler)
    }
}

// Connectives.
impl Sdd {
    pub fn and(&self, f: Ref, g: Ref) -> Ref {
        self.apply(f, g, Op::And)
    }

    pub fn or(&self, f: Ref, g: Ref) -> Ref {
        self.apply(f, g, Op::Or)
    }

    pub fn xor(&self, f: Ref, g: Ref) -> Ref {
        let a = self.and(f, self.negate(g));
        let b = self.and(self.negate(f), g);
        self.or(a, b)
    }

    pub fn implies(&self, f: Ref, g: Ref) -> Ref {
        self.or(self.negate(f), g)
    }

    pub fn equiv(&self, f: Ref, g: Ref) -> Ref {
        self.negate(self.xor(f, g))
    }

    /// If-then-else: `(c ∧ t) ∨ (¬c ∧ e)`.
    pub fn ite(&self, c: Ref, t: Ref, e: Ref) -> Ref {
        let a = self.and(c, t);
        let b = self.and(self.negate(c), e);
        self.or(a, b)
    }

    pub fn and_all(&self, fs: impl IntoIterator<Item = Ref>) -> Ref {
        fs.into_iter().fold(Ref::TRUE, |acc, f| self.and(acc, f))
    }

    pub fn or_all(&self, fs: impl IntoIterator<Item = Ref>) -> Ref {
        fs.into_iter().fold(Ref::FALSE, |acc, f| self.or(acc, f))
    }

    /// Conjunction of DIMACS-style literals.
    pub fn cube(&self, lits: impl IntoIterator<Item = i32>) -> Ref {
        self.and_all(lits.into_iter().map(|l| self.lit(l)).collect::<Vec<_>>())
    }

    /// Disjunction of DIMACS-style literals.
    pub fn clause(&self, lits: impl IntoIterator<Item = i32>) -> Ref {
        self.or_all(lits.into_iter().map(|l| self.lit(l)).collect::<Vec<_>>())
    }

    /// Conjunction of the given variables with the given phases.
    pub fn conjunction(&self, lits: &[(Var, bool)]) -> Ref {
        self.and_all(lits.iter().map(|&(v, phase)| self.literal(v, phase)))
    }
}
