//! Evaluation of SDDs under variable assignments.

use std::collections::HashMap;

use crate::node::SddNode;
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Var;

/// A partial assignment. Unassigned variables read as false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: HashMap<Var, bool>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an assignment from DIMACS-style literals.
    pub fn from_lits(lits: impl IntoIterator<Item = i32>) -> Self {
        lits.into_iter().collect()
    }

    pub fn set(&mut self, var: Var, value: bool) {
        self.values.insert(var, value);
    }

    pub fn with(mut self, var: Var, value: bool) -> Self {
        self.set(var, value);
        self
    }

    pub fn get(&self, var: Var) -> bool {
        self.values.get(&var).copied().unwrap_or(false)
    }

    pub fn is_assigned(&self, var: Var) -> bool {
        self.values.contains_key(&var)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<i32> for Assignment {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        let mut assignment = Self::new();
        for lit in iter {
            assert_ne!(lit, 0, "Literal must not be 0");
            assignment.set(Var::new(lit.unsigned_abs()), lit > 0);
        }
        assignment
    }
}

impl Sdd {
    /// Evaluates `f` under `assignment`.
    pub fn evaluate(&self, f: Ref, assignment: &Assignment) -> bool {
        let mut cache = HashMap::new();
        self.evaluate_rec(f, assignment, &mut cache)
    }

    fn evaluate_rec(&self, f: Ref, assignment: &Assignment, cache: &mut HashMap<Ref, bool>) -> bool {
        let elements = match self.node(f) {
            SddNode::Trivial(value) => return value,
            SddNode::Literal { var, phase } => return assignment.get(var) == phase,
            SddNode::Decomposition { elements, .. } => elements,
        };
        if let Some(&value) = cache.get(&f) {
            return value;
        }
        let mut value = false;
        for e in elements.iter() {
            if self.evaluate_rec(e.prime, assignment, cache) && self.evaluate_rec(e.sub, assignment, cache) {
                value = true;
                break;
            }
        }
        cache.insert(f, value);
        value
    }
}
