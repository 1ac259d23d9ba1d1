use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

use log::debug;

use crate::cache::{ApplyCache, ApplyKey};
use crate::node::{Element, SddNode};
use crate::reference::Ref;
use crate::restructure::{VtreeEdit, VtreeOperation};
use crate::types::Var;
use crate::vtree::{VtreeId, VtreeParseError, VtreeRoot, VtreeStore};

#[derive(Debug, Clone)]
pub struct SddConfig {
    /// Multiply looks up common primes with a hash join when both operands
    /// have more elements than this; smaller ones are scanned pairwise.
    pub hash_join_threshold: usize,
    /// Compress the accumulator after every step of a cartesian product.
    pub cartesian_compression: bool,
}

impl Default for SddConfig {
    fn default() -> Self {
        Self {
            hash_join_threshold: 8,
            cartesian_compression: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SddStats {
    /// Nodes ever allocated, including the two constants.
    pub nodes: usize,
    pub apply_calls: usize,
    /// Hits and misses of the apply cache of the current frame.
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub vtree_depth: usize,
}

struct Frame {
    vtree: Rc<VtreeRoot>,
    cache: ApplyCache,
}

impl Frame {
    fn new(vtree: VtreeRoot) -> Self {
        Self {
            vtree: Rc::new(vtree),
            cache: ApplyCache::new(),
        }
    }
}

/// SDD manager.
///
/// Owns the node arena, the unique table, the negation cache and a stack of
/// vtrees. Every operation interprets its operands under the vtree on top of
/// the stack. Nodes are never freed, so a node built under an older vtree
/// stays valid as long as its vtree nodes are part of the current one.
pub struct Sdd {
    config: SddConfig,
    store: RefCell<VtreeStore>,
    stack: RefCell<Vec<Frame>>,
    nodes: RefCell<Vec<SddNode>>,
    unique: RefCell<HashMap<(VtreeId, Rc<[Element]>), Ref>>,
    literals: RefCell<HashMap<(Var, bool), Ref>>,
    negations: RefCell<Vec<Option<Ref>>>,
    apply_calls: Cell<usize>,
}

impl Sdd {
    /// Creates a manager over `x1..=xn` with a balanced vtree.
    pub fn new(num_vars: u32) -> Self {
        Self::with_config(num_vars, SddConfig::default())
    }

    pub fn with_config(num_vars: u32, config: SddConfig) -> Self {
        assert!(num_vars > 0, "At least one variable is required");
        let vars: Vec<Var> = (1..=num_vars).map(Var::new).collect();
        let mut store = VtreeStore::new();
        let root = store.balanced(&vars);
        Self::from_vtree_with_config(store, root, config)
    }

    pub fn from_vtree(store: VtreeStore, root: VtreeId) -> Self {
        Self::from_vtree_with_config(store, root, SddConfig::default())
    }

    pub fn from_vtree_with_config(store: VtreeStore, root: VtreeId, config: SddConfig) -> Self {
        let vtree = VtreeRoot::new(&store, root);
        let vars = vtree.all_variables();

        let sdd = Self {
            config,
            store: RefCell::new(store),
            stack: RefCell::new(vec![Frame::new(vtree)]),
            nodes: RefCell::new(vec![SddNode::Trivial(false), SddNode::Trivial(true)]),
            unique: RefCell::new(HashMap::new()),
            literals: RefCell::new(HashMap::new()),
            negations: RefCell::new(vec![Some(Ref::TRUE), Some(Ref::FALSE)]),
            apply_calls: Cell::new(0),
        };

        for var in vars {
            let pos = sdd.alloc(SddNode::Literal { var, phase: true });
            let neg = sdd.alloc(SddNode::Literal { var, phase: false });
            sdd.link_negations(pos, neg);
            let mut literals = sdd.literals.borrow_mut();
            literals.insert((var, true), pos);
            literals.insert((var, false), neg);
        }
        debug!("Created SDD manager with vtree {}", sdd.vtree());
        sdd
    }

    /// Creates a manager from a vtree shape such as `"((1 2) (3 4))"`.
    pub fn parse_vtree(shape: &str) -> Result<Self, VtreeParseError> {
        let mut store = VtreeStore::new();
        let root = store.parse(shape)?;
        Ok(Self::from_vtree(store, root))
    }
}

impl Debug for Sdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdd")
            .field("nodes", &self.nodes.borrow().len())
            .field("vtree", &self.vtree().to_shape_string())
            .field("vtree_depth", &self.vtree_depth())
            .finish()
    }
}

impl Sdd {
    pub fn config(&self) -> &SddConfig {
        &self.config
    }

    pub fn stats(&self) -> SddStats {
        let stack = self.stack.borrow();
        let (cache_hits, cache_misses) = stack
            .last()
            .map(|frame| (frame.cache.hits(), frame.cache.misses()))
            .unwrap_or_default();
        SddStats {
            nodes: self.nodes.borrow().len(),
            apply_calls: self.apply_calls.get(),
            cache_hits,
            cache_misses,
            vtree_depth: stack.len(),
        }
    }

    /// Number of allocated nodes, including the constants.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn node(&self, f: Ref) -> SddNode {
        self.nodes.borrow()[f.index()].clone()
    }

    /// Elements of a decomposition, empty for constants and literals.
    pub fn elements(&self, f: Ref) -> Rc<[Element]> {
        match &self.nodes.borrow()[f.index()] {
            SddNode::Decomposition { elements, .. } => Rc::clone(elements),
            _ => Rc::from([]),
        }
    }

    /// The vtree node `f` is normalized for. `None` for constants.
    pub fn anchor(&self, f: Ref) -> Option<VtreeId> {
        match self.node(f) {
            SddNode::Trivial(_) => None,
            SddNode::Decomposition { vtree, .. } => Some(vtree),
            SddNode::Literal { var, .. } => self.vtree().leaf(var),
        }
    }

    pub fn is_literal(&self, f: Ref) -> bool {
        self.nodes.borrow()[f.index()].is_literal()
    }

    pub fn is_decomposition(&self, f: Ref) -> bool {
        self.nodes.borrow()[f.index()].is_decomposition()
    }

    /// Returns the literal `var` (or `¬var` for a negative phase).
    ///
    /// # Panics
    ///
    /// Panics if `var` does not occur in the vtree.
    pub fn literal(&self, var: Var, phase: bool) -> Ref {
        match self.literals.borrow().get(&(var, phase)) {
            Some(&f) => f,
            None => panic!("Variable {} is not part of the vtree", var),
        }
    }

    /// Returns the literal for a DIMACS-style signed integer.
    pub fn lit(&self, lit: i32) -> Ref {
        assert_ne!(lit, 0, "Literal must not be 0");
        self.literal(Var::new(lit.unsigned_abs()), lit > 0)
    }

    pub fn variable(&self, var: u32) -> Ref {
        self.literal(Var::new(var), true)
    }

    fn alloc(&self, node: SddNode) -> Ref {
        let mut nodes = self.nodes.borrow_mut();
        let f = Ref::new(nodes.len() as u32);
        nodes.push(node);
        self.negations.borrow_mut().push(None);
        f
    }

    fn link_negations(&self, f: Ref, g: Ref) {
        let mut negations = self.negations.borrow_mut();
        negations[f.index()] = Some(g);
        negations[g.index()] = Some(f);
    }

    /// The negation of `f`, if it was already computed.
    pub fn known_negation(&self, f: Ref) -> Option<Ref> {
        self.negations.borrow()[f.index()]
    }

    /// Returns the unique decomposition node at `vtree` with `elements`.
    ///
    /// `elements` must already be a compressed and trimmed partition.
    pub(crate) fn make_decomposition(&self, vtree: VtreeId, mut elements: Vec<Element>) -> Ref {
        debug_assert!(elements.len() >= 2, "a trimmed decomposition has at least two elements");
        elements.sort_unstable();
        debug_assert!(
            elements.windows(2).all(|w| w[0].sub != w[1].sub),
            "decomposition subs must be distinct"
        );
        let elements: Rc<[Element]> = elements.into();
        let key = (vtree, Rc::clone(&elements));
        if let Some(&f) = self.unique.borrow().get(&key) {
            return f;
        }
        let f = self.alloc(SddNode::Decomposition { vtree, elements });
        self.unique.borrow_mut().insert(key, f);
        f
    }

    /// Negates `f`.
    ///
    /// Negation never needs apply: it maps every sub to its negation, which
    /// keeps the partition compressed and trimmed.
    pub fn negate(&self, f: Ref) -> Ref {
        if let Some(g) = self.known_negation(f) {
            return g;
        }
        let (vtree, elements) = match self.node(f) {
            SddNode::Decomposition { vtree, elements } => (vtree, elements),
            node => unreachable!("negations of {} are linked on creation", node),
        };
        let negated = elements
            .iter()
            .map(|e| Element::new(e.prime, self.negate(e.sub)))
            .collect();
        let g = self.make_decomposition(vtree, negated);
        self.link_negations(f, g);
        g
    }
}

// Vtree stack.
impl Sdd {
    /// The vtree on top of the stack.
    pub fn vtree(&self) -> Rc<VtreeRoot> {
        match self.stack.borrow().last() {
            Some(frame) => Rc::clone(&frame.vtree),
            None => unreachable!("the vtree stack is never empty"),
        }
    }

    pub fn vtree_depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Opens a speculative scope over the vtree stack.
    ///
    /// Every vtree pushed while the returned guard is alive is popped again
    /// when the guard is dropped, unless it is [committed][VtreeShadow::commit].
    pub fn speculate(&self) -> VtreeShadow<'_> {
        VtreeShadow {
            sdd: self,
            depth: self.vtree_depth(),
            armed: true,
        }
    }

    /// Pops vtrees until `depth` remain. Nodes built under the popped vtrees
    /// stay in the arena but are not valid operands anymore.
    pub fn truncate_vtree_stack(&self, depth: usize) {
        assert!(depth >= 1, "Cannot pop the initial vtree");
        let mut stack = self.stack.borrow_mut();
        if stack.len() > depth {
            debug!("Popping {} vtree(s), back to depth {}", stack.len() - depth, depth);
            stack.truncate(depth);
        }
    }

    /// Keeps only the topmost of the vtrees above `depth`.
    pub(crate) fn squash_vtree_stack(&self, depth: usize) {
        let mut stack = self.stack.borrow_mut();
        if stack.len() > depth + 1 {
            let top = stack.len() - 1;
            stack.drain(depth..top);
        }
    }

    /// Edits the current vtree and pushes the result.
    pub(crate) fn push_restructured(&self, operation: VtreeOperation) -> VtreeEdit {
        let current = self.vtree();
        let edit = self.store.borrow_mut().restructure(&current, operation);
        let vtree = VtreeRoot::new(&self.store.borrow(), edit.root);
        self.stack.borrow_mut().push(Frame::new(vtree));
        edit
    }

    pub(crate) fn cache_lookup(&self, key: &ApplyKey) -> Option<Ref> {
        self.stack.borrow_mut().last_mut().and_then(|frame| frame.cache.get(key))
    }

    /// Runs `f` without its applies showing up in [`stats`][Sdd::stats].
    ///
    /// What `f` computes stays in the apply cache and the unique table.
    pub(crate) fn unrecorded<T>(&self, f: impl FnOnce() -> T) -> T {
        let calls = self.apply_calls.get();
        let counts = self.stack.borrow().last().map(|frame| (frame.cache.hits(), frame.cache.misses()));
        let result = f();
        self.apply_calls.set(calls);
        if let (Some((hits, misses)), Some(frame)) = (counts, self.stack.borrow_mut().last_mut()) {
            frame.cache.restore_counts(hits, misses);
        }
        result
    }

    pub(crate) fn cache_store(&self, key: ApplyKey, value: Ref) {
        if let Some(frame) = self.stack.borrow_mut().last_mut() {
            frame.cache.insert(key, value);
        }
        self.apply_calls.set(self.apply_calls.get() + 1);
    }
}

/// Scope guard over the vtree stack, see [`Sdd::speculate`].
#[must_use = "dropping the shadow immediately pops the pushed vtrees"]
pub struct VtreeShadow<'a> {
    sdd: &'a Sdd,
    depth: usize,
    armed: bool,
}

impl VtreeShadow<'_> {
    /// Stack depth when the scope was opened.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Keeps the pushed vtrees.
    pub fn commit(mut self) {
        self.armed = false;
    }

    /// Pops the pushed vtrees now.
    pub fn rollback(self) {}
}

impl Drop for VtreeShadow<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.sdd.truncate_vtree_stack(self.depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_literals_are_linked() {
        let sdd = Sdd::new(3);
        let x = sdd.variable(2);
        let nx = sdd.lit(-2);
        assert_ne!(x, nx);
        assert_eq!(sdd.negate(x), nx);
        assert_eq!(sdd.negate(nx), x);
        assert_eq!(sdd.negate(Ref::TRUE), Ref::FALSE);
        assert_eq!(sdd.node(nx), SddNode::Literal { var: Var::new(2), phase: false });
        // two constants plus two literals per variable
        assert_eq!(sdd.num_nodes(), 8);
    }

    #[test]
    #[should_panic(expected = "not part of the vtree")]
    fn test_unknown_variable() {
        let sdd = Sdd::new(2);
        sdd.variable(3);
    }

    #[test]
    fn test_shadow_rollback_and_commit() {
        let sdd = Sdd::parse_vtree("((1 2) 3)").unwrap();
        let root = sdd.vtree().root();
        {
            let _shadow = sdd.speculate();
            sdd.push_restructured(VtreeOperation::RotateRight(root));
            assert_eq!(sdd.vtree_depth(), 2);
            assert_eq!(sdd.vtree().to_shape_string(), "(x1 (x2 x3))");
        }
        assert_eq!(sdd.vtree_depth(), 1);
        assert_eq!(sdd.vtree().root(), root);

        let shadow = sdd.speculate();
        sdd.push_restructured(VtreeOperation::Swap(root));
        shadow.commit();
        assert_eq!(sdd.vtree_depth(), 2);
        assert_eq!(sdd.vtree().to_shape_string(), "(x3 (x1 x2))");
    }

    #[test]
    fn test_squash_keeps_top() {
        let sdd = Sdd::parse_vtree("((1 2) 3)").unwrap();
        let root = sdd.vtree().root();
        let edit = sdd.push_restructured(VtreeOperation::Swap(root));
        sdd.push_restructured(VtreeOperation::Swap(sdd.vtree().right(edit.root)));
        assert_eq!(sdd.vtree_depth(), 3);
        let top = sdd.vtree().root();
        sdd.squash_vtree_stack(1);
        assert_eq!(sdd.vtree_depth(), 2);
        assert_eq!(sdd.vtree().root(), top);
    }
}
