//! Sizes, supports and model counts.

use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::node::SddNode;
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Var;
use crate::vtree::{VtreeId, VtreeRoot};

impl Sdd {
    /// All distinct nodes reachable from `roots`, constants included.
    pub fn descendants(&self, roots: &[Ref]) -> HashSet<Ref> {
        let mut visited = HashSet::new();
        let mut stack = roots.to_vec();
        while let Some(f) = stack.pop() {
            if !visited.insert(f) {
                continue;
            }
            for e in self.elements(f).iter() {
                stack.push(e.prime);
                stack.push(e.sub);
            }
        }
        visited
    }

    /// Number of distinct nodes reachable from `roots`, constants and
    /// literals included.
    ///
    /// This is the measure minimization works on.
    pub fn size(&self, roots: &[Ref]) -> usize {
        self.descendants(roots).len()
    }

    pub fn size_of(&self, f: Ref) -> usize {
        self.size(&[f])
    }

    /// Number of distinct decomposition nodes reachable from `roots`.
    pub fn decomposition_count(&self, roots: &[Ref]) -> usize {
        self.descendants(roots)
            .into_iter()
            .filter(|&f| self.is_decomposition(f))
            .count()
    }

    /// Total number of elements over distinct reachable decompositions.
    pub fn element_count(&self, roots: &[Ref]) -> usize {
        self.descendants(roots)
            .into_iter()
            .map(|f| self.elements(f).len())
            .sum()
    }

    /// The variables `f` mentions, in ascending order.
    pub fn variables(&self, f: Ref) -> Vec<Var> {
        let mut vars: Vec<Var> = self
            .descendants(&[f])
            .into_iter()
            .filter_map(|g| match self.node(g) {
                SddNode::Literal { var, .. } => Some(var),
                _ => None,
            })
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Variables below `outer` that are not below `inner`.
    ///
    /// `inner = None` stands for a constant, which covers no variables.
    pub fn gap_variables(&self, inner: Option<VtreeId>, outer: VtreeId) -> Vec<Var> {
        let vtree = self.vtree();
        let covered: HashSet<Var> = match inner {
            Some(inner) => vtree.variables(inner).into_iter().collect(),
            None => HashSet::new(),
        };
        vtree
            .variables(outer)
            .into_iter()
            .filter(|v| !covered.contains(v))
            .collect()
    }

    /// The lowest vtree node covering all of `vars`.
    pub fn lca_of_vars(&self, vars: &[Var]) -> Option<VtreeId> {
        self.vtree().lca_of_vars(vars)
    }

    /// Number of satisfying assignments of `f` over all vtree variables.
    pub fn model_count(&self, f: Ref) -> BigUint {
        let vtree = self.vtree();
        let mut cache = HashMap::new();
        self.count_below(f, vtree.root(), &vtree, &mut cache)
    }

    /// Models of `f` over the variables of `v`, where `f` lives below `v`.
    fn count_below(&self, f: Ref, v: VtreeId, vtree: &VtreeRoot, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        let all = vtree.var_count(v) as u64;
        match self.node(f) {
            SddNode::Trivial(false) => BigUint::zero(),
            SddNode::Trivial(true) => BigUint::one() << all,
            SddNode::Literal { .. } => BigUint::one() << (all - 1),
            SddNode::Decomposition { vtree: u, .. } => {
                let gap = all - vtree.var_count(u) as u64;
                self.count_at_anchor(f, u, vtree, cache) << gap
            }
        }
    }

    fn count_at_anchor(&self, f: Ref, u: VtreeId, vtree: &VtreeRoot, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if let Some(count) = cache.get(&f) {
            return count.clone();
        }
        let (left, right) = (vtree.left(u), vtree.right(u));
        let mut count = BigUint::zero();
        for e in self.elements(f).iter() {
            if e.sub.is_false() {
                continue;
            }
            let primes = self.count_below(e.prime, left, vtree, cache);
            let subs = self.count_below(e.sub, right, vtree, cache);
            count += primes * subs;
        }
        cache.insert(f, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_size_counts_shared_nodes_once() {
        let sdd = Sdd::new(4);
        let (a, b, c, d) = (sdd.variable(1), sdd.variable(2), sdd.variable(3), sdd.variable(4));
        let ab = sdd.and(a, b);
        let f = sdd.or(ab, sdd.and(c, d));
        let g = sdd.and(ab, c);
        assert_eq!(sdd.size_of(Ref::TRUE), 1);
        assert_eq!(sdd.size_of(a), 1);
        assert_eq!(sdd.size(&[Ref::TRUE, a]), 2);
        // x1∧x2 = {(x1, x2), (¬x1, ⊥)}
        assert_eq!(sdd.size_of(ab), 5);
        assert_eq!(sdd.decomposition_count(&[ab]), 1);
        assert_eq!(sdd.decomposition_count(&[Ref::TRUE, a]), 0);
        let both = sdd.size(&[f, g]);
        assert!(both < sdd.size_of(f) + sdd.size_of(g));
        assert_eq!(sdd.size(&[f, f]), sdd.size_of(f));
    }

    #[test]
    fn test_variables() {
        let sdd = Sdd::new(5);
        let f = sdd.or(sdd.cube([1, -4]), sdd.variable(2));
        assert_eq!(sdd.variables(f), vec![Var::new(1), Var::new(2), Var::new(4)]);
        assert!(sdd.variables(Ref::TRUE).is_empty());
    }

    #[test]
    fn test_model_count() {
        let sdd = Sdd::new(4);
        let (a, b) = (sdd.variable(1), sdd.variable(2));
        assert_eq!(sdd.model_count(Ref::TRUE), BigUint::from(16u32));
        assert_eq!(sdd.model_count(Ref::FALSE), BigUint::zero());
        assert_eq!(sdd.model_count(a), BigUint::from(8u32));
        assert_eq!(sdd.model_count(sdd.and(a, b)), BigUint::from(4u32));
        assert_eq!(sdd.model_count(sdd.or(a, b)), BigUint::from(12u32));
        assert_eq!(sdd.model_count(sdd.xor(a, sdd.variable(4))), BigUint::from(8u32));
        assert_eq!(sdd.model_count(sdd.cube([1, 2, 3, 4])), BigUint::one());
    }

    #[test]
    fn test_gap_variables() {
        let sdd = Sdd::parse_vtree("((1 2) (3 4))").unwrap();
        let vtree = sdd.vtree();
        let left = vtree.left(vtree.root());
        assert_eq!(sdd.gap_variables(Some(left), vtree.root()), vec![Var::new(3), Var::new(4)]);
        assert_eq!(sdd.gap_variables(None, left), vec![Var::new(1), Var::new(2)]);
        assert_eq!(sdd.lca_of_vars(&[Var::new(1), Var::new(2)]), Some(left));
    }
}
