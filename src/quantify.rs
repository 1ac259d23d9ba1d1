//! Existential and universal quantification.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::handler::{uncancelable, Cancelable, ComputationHandler, NopHandler};
use crate::node::{Element, SddNode};
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::{Op, Var};
use crate::vtree::{VtreeId, VtreeRoot};

struct Quantified {
    vars: HashSet<Var>,
    leaves: Vec<VtreeId>,
}

impl Quantified {
    fn new(vtree: &VtreeRoot, vars: &[Var]) -> Self {
        let vars: HashSet<Var> = vars.iter().copied().collect();
        let leaves = vars.iter().filter_map(|&v| vtree.leaf(v)).collect();
        Self { vars, leaves }
    }

    fn touches(&self, vtree: &VtreeRoot, v: VtreeId) -> bool {
        self.leaves.iter().any(|&leaf| vtree.is_subtree(leaf, v))
    }
}

impl Sdd {
    /// `∃ vars. f`
    pub fn exists(&self, vars: &[Var], f: Ref) -> Ref {
        uncancelable(self.exists_with(vars, f, &mut NopHandler))
    }

    pub fn exists_with(&self, vars: &[Var], f: Ref, handler: &mut dyn ComputationHandler) -> Cancelable<Ref> {
        let quantified = Quantified::new(&self.vtree(), vars);
        debug!("exists: {} variable(s) over {}", quantified.leaves.len(), f);
        let mut cache = HashMap::new();
        self.exists_rec(f, &quantified, &mut cache, handler)
    }

    /// `∀ vars. f`, computed as `¬∃ vars. ¬f`.
    pub fn forall(&self, vars: &[Var], f: Ref) -> Ref {
        uncancelable(self.forall_with(vars, f, &mut NopHandler))
    }

    pub fn forall_with(&self, vars: &[Var], f: Ref, handler: &mut dyn ComputationHandler) -> Cancelable<Ref> {
        let g = self.exists_with(vars, self.negate(f), handler)?;
        Ok(self.negate(g))
    }

    /// `∃ var. f = f|var ∨ f|¬var`
    pub fn exists_var(&self, var: Var, f: Ref) -> Ref {
        let pos = self.restrict(var, true, f);
        let neg = self.restrict(var, false, f);
        self.or(pos, neg)
    }

    /// `∀ var. f = f|var ∧ f|¬var`
    pub fn forall_var(&self, var: Var, f: Ref) -> Ref {
        let pos = self.restrict(var, true, f);
        let neg = self.restrict(var, false, f);
        self.and(pos, neg)
    }

    fn exists_rec(
        &self,
        f: Ref,
        quantified: &Quantified,
        cache: &mut HashMap<Ref, Ref>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let (vtree, elements) = match self.node(f) {
            SddNode::Trivial(_) => return Ok(f),
            SddNode::Literal { var, .. } => {
                return Ok(if quantified.vars.contains(&var) { Ref::TRUE } else { f });
            }
            SddNode::Decomposition { vtree, elements } => (vtree, elements),
        };
        if !quantified.touches(&self.vtree(), vtree) {
            return Ok(f);
        }
        if let Some(&g) = cache.get(&f) {
            return Ok(g);
        }

        let mut changed = false;
        let mut is_partition = true;
        let mut quantified_elements = Vec::with_capacity(elements.len());
        let mut absorbed = false;
        for e in elements.iter() {
            let prime = self.exists_rec(e.prime, quantified, cache, handler)?;
            let sub = self.exists_rec(e.sub, quantified, cache, handler)?;
            if prime != e.prime {
                changed = true;
                is_partition = false;
            }
            if sub != e.sub {
                changed = true;
            }
            if prime.is_true() && sub.is_true() {
                absorbed = true;
                break;
            }
            quantified_elements.push(Element::new(prime, sub));
        }

        let g = if absorbed {
            Ref::TRUE
        } else if !changed {
            f
        } else if is_partition {
            self.canonical_node(vtree, quantified_elements, handler)?
        } else {
            // Quantified primes overlap: disjoin the elements one by one.
            let mut acc = Ref::FALSE;
            for e in quantified_elements {
                let term = self.apply_rec(e.prime, e.sub, Op::And, handler)?;
                acc = self.apply_rec(acc, term, Op::Or, handler)?;
            }
            acc
        };
        cache.insert(f, g);
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::handler::{ComputationEvent, EventLimitHandler};

    /// `{(x1, x3), (¬x1∧x2, x3∧x4), (¬x1∧¬x2, x4)}` over `((1 2) (3 4))`.
    fn staircase(sdd: &Sdd) -> Ref {
        let (a, b, c, d) = (sdd.variable(1), sdd.variable(2), sdd.variable(3), sdd.variable(4));
        let (na, nb) = (sdd.negate(a), sdd.negate(b));
        sdd.or(
            sdd.or(sdd.and(a, c), sdd.and(sdd.and(na, b), sdd.and(c, d))),
            sdd.and(sdd.and(na, nb), d),
        )
    }

    #[test]
    fn test_exists_single_matches_restrict() {
        let sdd = Sdd::new(4);
        let (a, b, c, d) = (sdd.variable(1), sdd.variable(2), sdd.variable(3), sdd.variable(4));
        let f = sdd.or(sdd.and(a, c), sdd.and(sdd.negate(b), d));
        for i in 1..=4 {
            let v = Var::new(i);
            assert_eq!(sdd.exists(&[v], f), sdd.exists_var(v, f), "∃x{}", i);
            assert_eq!(sdd.forall(&[v], f), sdd.forall_var(v, f), "∀x{}", i);
        }
    }

    #[test]
    fn test_exists_many() {
        let sdd = Sdd::new(4);
        let (a, b, c, d) = (sdd.variable(1), sdd.variable(2), sdd.variable(3), sdd.variable(4));
        let f = sdd.and(sdd.xor(a, c), sdd.xor(b, d));
        assert_eq!(sdd.exists(&[Var::new(1), Var::new(2)], f), Ref::TRUE);
        assert_eq!(sdd.forall(&[Var::new(1)], f), Ref::FALSE);
        assert_eq!(sdd.exists(&[Var::new(3)], f), sdd.xor(b, d));

        let g = sdd.and(a, b);
        assert_eq!(sdd.exists(&[Var::new(3), Var::new(4)], g), g, "untouched node is returned as is");
        assert_eq!(sdd.exists(&[Var::new(1)], g), b);
    }

    #[test]
    fn test_exists_canceled_on_merge() {
        let sdd = Sdd::new(4);
        let f = staircase(&sdd);
        let x4 = Var::new(4);

        // Both x3∧x4 and x4 lose x4, so two primes must be disjoined.
        let mut limit = EventLimitHandler::apply_calls(0);
        let canceled = sdd.exists_with(&[x4], f, &mut limit).unwrap_err();
        assert_eq!(canceled.event, ComputationEvent::SddApply);

        let g = sdd.exists_with(&[x4], f, &mut NopHandler).unwrap();
        assert_eq!(g, sdd.exists_var(x4, f));
        assert_eq!(g, sdd.restrict(x4, true, f), "f is monotone in x4");
    }

    #[test]
    fn test_forall_canceled_on_merge() {
        let sdd = Sdd::new(4);
        let f = staircase(&sdd);
        let x4 = Var::new(4);

        let mut limit = EventLimitHandler::apply_calls(0);
        let canceled = sdd.forall_with(&[x4], f, &mut limit).unwrap_err();
        assert_eq!(canceled.event, ComputationEvent::SddApply);

        let g = sdd.forall_with(&[x4], f, &mut NopHandler).unwrap();
        assert_eq!(g, sdd.forall_var(x4, f));
        assert_eq!(g, sdd.and(sdd.variable(1), sdd.variable(3)));
    }

    #[test]
    fn test_exists_canceled_in_disjunction() {
        let sdd = Sdd::new(4);
        let f = staircase(&sdd);
        let x1 = Var::new(1);

        // Quantified primes overlap, so the elements are disjoined one by one.
        let mut limit = EventLimitHandler::apply_calls(0);
        let canceled = sdd.exists_with(&[x1], f, &mut limit).unwrap_err();
        assert_eq!(canceled.event, ComputationEvent::SddApply);

        let g = sdd.exists_with(&[x1], f, &mut NopHandler).unwrap();
        assert_eq!(g, sdd.exists_var(x1, f));
    }
}
