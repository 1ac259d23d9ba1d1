//! Conditioning on a literal.

use std::collections::HashMap;

use crate::handler::{uncancelable, Cancelable, ComputationHandler, NopHandler};
use crate::node::{Element, SddNode};
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Var;
use crate::vtree::VtreeId;

impl Sdd {
    /// Returns `f` with `var` fixed to `phase`.
    pub fn restrict(&self, var: Var, phase: bool, f: Ref) -> Ref {
        uncancelable(self.restrict_with(var, phase, f, &mut NopHandler))
    }

    pub fn restrict_with(
        &self,
        var: Var,
        phase: bool,
        f: Ref,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let leaf = match self.vtree().leaf(var) {
            Some(leaf) => leaf,
            None => panic!("Variable {} is not part of the vtree", var),
        };
        let mut cache = HashMap::new();
        self.restrict_rec(var, phase, leaf, f, &mut cache, handler)
    }

    /// Restricts by every literal of a DIMACS-style cube in turn.
    pub fn restrict_cube(&self, lits: &[i32], f: Ref) -> Ref {
        lits.iter().fold(f, |acc, &lit| {
            assert_ne!(lit, 0, "Literal must not be 0");
            self.restrict(Var::new(lit.unsigned_abs()), lit > 0, acc)
        })
    }

    fn restrict_rec(
        &self,
        var: Var,
        phase: bool,
        leaf: VtreeId,
        f: Ref,
        cache: &mut HashMap<Ref, Ref>,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Ref> {
        let (vtree, elements) = match self.node(f) {
            SddNode::Trivial(_) => return Ok(f),
            SddNode::Literal { var: v, phase: p } => {
                return Ok(if v == var { Ref::constant(p == phase) } else { f });
            }
            SddNode::Decomposition { vtree, elements } => (vtree, elements),
        };

        let current = self.vtree();
        if !current.is_subtree(leaf, vtree) {
            return Ok(f);
        }
        if let Some(&g) = cache.get(&f) {
            return Ok(g);
        }

        let mut restricted = Vec::with_capacity(elements.len());
        if current.is_in_left(leaf, vtree) {
            for e in elements.iter() {
                let prime = self.restrict_rec(var, phase, leaf, e.prime, cache, handler)?;
                if !prime.is_false() {
                    restricted.push(Element::new(prime, e.sub));
                }
            }
        } else {
            for e in elements.iter() {
                let sub = self.restrict_rec(var, phase, leaf, e.sub, cache, handler)?;
                restricted.push(Element::new(e.prime, sub));
            }
        }

        let g = self.canonical_node(vtree, restricted, handler)?;
        cache.insert(f, g);
        Ok(g)
    }
}
