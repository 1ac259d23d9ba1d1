//! Variable trees (vtrees).
//!
//! A vtree is a full binary tree whose leaves are the variables. An internal
//! node splits its variables into a *prime* side (left) and a *sub* side
//! (right); a decomposition anchored at that node has primes over the left
//! variables and subs over the right ones.
//!
//! # Representation
//!
//! Vtree nodes live in a hash-consed, append-only [`VtreeStore`]: a subtree is
//! identified by its shape, so `(x1 x2)` gets the same [`VtreeId`] in every
//! tree that contains it. A [`VtreeRoot`] is an immutable snapshot of one tree
//! with the derived data apply needs (in-order positions, parents, variable
//! counts). Restructuring never mutates a root: it builds new internal nodes in
//! the store and a new `VtreeRoot` on top of them, so SDD nodes anchored in an
//! untouched subtree stay valid under both roots.
//!
//! ```text
//!          (x1 ((x2 x3) x4))
//!          /              \
//!        x1           ((x2 x3) x4)
//!                      /        \
//!                  (x2 x3)       x4
//!                  /     \
//!                x2       x3
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display};

use thiserror::Error;

use crate::types::Var;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VtreeId(u32);

impl VtreeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for VtreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VtreeNode {
    Leaf(Var),
    Internal(VtreeId, VtreeId),
}

impl VtreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, VtreeNode::Leaf(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, VtreeNode::Internal(..))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VtreeParseError {
    #[error("unexpected character '{found}' at position {position}")]
    Unexpected { position: usize, found: char },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("variable {0} occurs more than once")]
    DuplicateVariable(u32),
    #[error("invalid variable '{0}'")]
    InvalidVariable(String),
}

/// Hash-consed storage of vtree nodes.
#[derive(Debug, Default)]
pub struct VtreeStore {
    nodes: Vec<VtreeNode>,
    unique: HashMap<VtreeNode, VtreeId>,
}

impl VtreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct vtree nodes ever created.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: VtreeId) -> VtreeNode {
        self.nodes[id.index()]
    }

    fn put(&mut self, node: VtreeNode) -> VtreeId {
        if let Some(&id) = self.unique.get(&node) {
            return id;
        }
        let id = VtreeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        self.unique.insert(node, id);
        id
    }

    pub fn leaf(&mut self, var: Var) -> VtreeId {
        self.put(VtreeNode::Leaf(var))
    }

    pub fn internal(&mut self, left: VtreeId, right: VtreeId) -> VtreeId {
        assert_ne!(left, right, "Children of a vtree node must differ");
        self.put(VtreeNode::Internal(left, right))
    }

    /// Builds a balanced vtree over the given variables (in order).
    pub fn balanced(&mut self, vars: &[Var]) -> VtreeId {
        assert!(!vars.is_empty(), "Must have at least one variable");
        if vars.len() == 1 {
            return self.leaf(vars[0]);
        }
        let mid = vars.len() / 2;
        let left = self.balanced(&vars[..mid]);
        let right = self.balanced(&vars[mid..]);
        self.internal(left, right)
    }

    /// Builds a right-linear vtree `(x1 (x2 (... xn)))`.
    pub fn right_linear(&mut self, vars: &[Var]) -> VtreeId {
        assert!(!vars.is_empty(), "Must have at least one variable");
        let mut current = self.leaf(vars[vars.len() - 1]);
        for &var in vars[..vars.len() - 1].iter().rev() {
            let leaf = self.leaf(var);
            current = self.internal(leaf, current);
        }
        current
    }

    /// Builds a left-linear vtree `(((x1 x2) ...) xn)`.
    pub fn left_linear(&mut self, vars: &[Var]) -> VtreeId {
        assert!(!vars.is_empty(), "Must have at least one variable");
        let mut current = self.leaf(vars[0]);
        for &var in &vars[1..] {
            let leaf = self.leaf(var);
            current = self.internal(current, leaf);
        }
        current
    }

    /// Builds a vtree from a parenthesized shape such as `"(1 ((2 3) 4))"`.
    pub fn parse(&mut self, input: &str) -> Result<VtreeId, VtreeParseError> {
        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0;
        let mut seen = Vec::new();
        let id = self.parse_rec(&chars, &mut pos, &mut seen)?;
        skip_spaces(&chars, &mut pos);
        if pos < chars.len() {
            return Err(VtreeParseError::Unexpected {
                position: pos,
                found: chars[pos],
            });
        }
        Ok(id)
    }

    fn parse_rec(&mut self, chars: &[char], pos: &mut usize, seen: &mut Vec<u32>) -> Result<VtreeId, VtreeParseError> {
        skip_spaces(chars, pos);
        match chars.get(*pos) {
            None => Err(VtreeParseError::UnexpectedEof),
            Some('(') => {
                *pos += 1;
                let left = self.parse_rec(chars, pos, seen)?;
                let right = self.parse_rec(chars, pos, seen)?;
                skip_spaces(chars, pos);
                match chars.get(*pos) {
                    Some(')') => {
                        *pos += 1;
                        Ok(self.internal(left, right))
                    }
                    Some(&c) => Err(VtreeParseError::Unexpected { position: *pos, found: c }),
                    None => Err(VtreeParseError::UnexpectedEof),
                }
            }
            Some(c) if c.is_ascii_alphanumeric() => {
                let start = *pos;
                while *pos < chars.len() && chars[*pos].is_ascii_alphanumeric() {
                    *pos += 1;
                }
                let token: String = chars[start..*pos].iter().collect();
                let digits = token.trim_start_matches('x');
                let id = match digits.parse::<u32>() {
                    Ok(id) if id > 0 => id,
                    _ => return Err(VtreeParseError::InvalidVariable(token)),
                };
                if seen.contains(&id) {
                    return Err(VtreeParseError::DuplicateVariable(id));
                }
                seen.push(id);
                Ok(self.leaf(Var::new(id)))
            }
            Some(&c) => Err(VtreeParseError::Unexpected { position: *pos, found: c }),
        }
    }
}

fn skip_spaces(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

/// Per-node data of a rooted vtree.
#[derive(Debug, Clone, Copy)]
struct Slot {
    node: VtreeNode,
    parent: Option<VtreeId>,
    /// In-order position.
    position: u32,
    /// Position range `first..=last` covered by the subtree.
    first: u32,
    last: u32,
    vars: u32,
}

/// An immutable rooted vtree.
///
/// Positions follow an in-order traversal, so every subtree covers a
/// contiguous position interval and subtree tests are two comparisons.
#[derive(Debug, Clone)]
pub struct VtreeRoot {
    root: VtreeId,
    slots: HashMap<VtreeId, Slot>,
    leaves: HashMap<Var, VtreeId>,
    in_order: Vec<VtreeId>,
}

impl VtreeRoot {
    pub fn new(store: &VtreeStore, root: VtreeId) -> Self {
        let mut vtree = Self {
            root,
            slots: HashMap::new(),
            leaves: HashMap::new(),
            in_order: Vec::new(),
        };
        vtree.build(store, root, None);
        vtree
    }

    fn build(&mut self, store: &VtreeStore, id: VtreeId, parent: Option<VtreeId>) -> (u32, u32, u32) {
        let node = store.node(id);
        let (first, position, last, vars) = match node {
            VtreeNode::Leaf(var) => {
                let position = self.in_order.len() as u32;
                self.in_order.push(id);
                let previous = self.leaves.insert(var, id);
                assert!(previous.is_none(), "Variable {} occurs twice in the vtree", var);
                (position, position, position, 1)
            }
            VtreeNode::Internal(left, right) => {
                let (first, _, left_vars) = self.build(store, left, Some(id));
                let position = self.in_order.len() as u32;
                self.in_order.push(id);
                let (_, last, right_vars) = self.build(store, right, Some(id));
                (first, position, last, left_vars + right_vars)
            }
        };
        self.slots.insert(
            id,
            Slot {
                node,
                parent,
                position,
                first,
                last,
                vars,
            },
        );
        (first, last, vars)
    }

    fn slot(&self, id: VtreeId) -> &Slot {
        match self.slots.get(&id) {
            Some(slot) => slot,
            None => panic!("Vtree node {} is not part of this vtree", id),
        }
    }

    pub fn root(&self) -> VtreeId {
        self.root
    }

    pub fn contains(&self, id: VtreeId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn node(&self, id: VtreeId) -> VtreeNode {
        self.slot(id).node
    }

    pub fn num_nodes(&self) -> usize {
        self.in_order.len()
    }

    pub fn num_vars(&self) -> usize {
        self.leaves.len()
    }

    pub fn position(&self, id: VtreeId) -> u32 {
        self.slot(id).position
    }

    pub fn parent(&self, id: VtreeId) -> Option<VtreeId> {
        self.slot(id).parent
    }

    pub fn is_leaf(&self, id: VtreeId) -> bool {
        self.node(id).is_leaf()
    }

    /// Left child of an internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf.
    pub fn left(&self, id: VtreeId) -> VtreeId {
        match self.node(id) {
            VtreeNode::Internal(left, _) => left,
            VtreeNode::Leaf(_) => panic!("Vtree node {} is a leaf", id),
        }
    }

    /// Right child of an internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf.
    pub fn right(&self, id: VtreeId) -> VtreeId {
        match self.node(id) {
            VtreeNode::Internal(_, right) => right,
            VtreeNode::Leaf(_) => panic!("Vtree node {} is a leaf", id),
        }
    }

    pub fn var(&self, id: VtreeId) -> Var {
        match self.node(id) {
            VtreeNode::Leaf(var) => var,
            VtreeNode::Internal(..) => panic!("Vtree node {} is not a leaf", id),
        }
    }

    /// The leaf of a variable, if the variable occurs in this vtree.
    pub fn leaf(&self, var: Var) -> Option<VtreeId> {
        self.leaves.get(&var).copied()
    }

    /// Number of variables below (and including) a node.
    pub fn var_count(&self, id: VtreeId) -> usize {
        self.slot(id).vars as usize
    }

    /// Variables below a node, left to right.
    pub fn variables(&self, id: VtreeId) -> Vec<Var> {
        let slot = self.slot(id);
        (slot.first..=slot.last)
            .map(|p| self.in_order[p as usize])
            .filter_map(|v| match self.node(v) {
                VtreeNode::Leaf(var) => Some(var),
                VtreeNode::Internal(..) => None,
            })
            .collect()
    }

    /// All variables, left to right.
    pub fn all_variables(&self) -> Vec<Var> {
        self.variables(self.root)
    }

    /// Returns true if `a` lies in the subtree rooted at `b` (including `b` itself).
    pub fn is_subtree(&self, a: VtreeId, b: VtreeId) -> bool {
        let p = self.position(a);
        let sb = self.slot(b);
        sb.first <= p && p <= sb.last
    }

    /// Returns true if `a` lies in the left subtree of `b`.
    pub fn is_in_left(&self, a: VtreeId, b: VtreeId) -> bool {
        match self.node(b) {
            VtreeNode::Internal(left, _) => self.is_subtree(a, left),
            VtreeNode::Leaf(_) => false,
        }
    }

    /// Returns true if `a` lies in the right subtree of `b`.
    pub fn is_in_right(&self, a: VtreeId, b: VtreeId) -> bool {
        match self.node(b) {
            VtreeNode::Internal(_, right) => self.is_subtree(a, right),
            VtreeNode::Leaf(_) => false,
        }
    }

    /// Lowest common ancestor of two nodes.
    pub fn lca(&self, a: VtreeId, b: VtreeId) -> VtreeId {
        let mut current = a;
        while !self.is_subtree(b, current) {
            current = match self.parent(current) {
                Some(parent) => parent,
                None => unreachable!("the root contains every node"),
            };
        }
        current
    }

    /// Lowest common ancestor of the leaves of the given variables.
    pub fn lca_of_vars(&self, vars: &[Var]) -> Option<VtreeId> {
        let mut leaves = vars.iter().filter_map(|&v| self.leaf(v));
        let first = leaves.next()?;
        Some(leaves.fold(first, |acc, leaf| self.lca(acc, leaf)))
    }

    /// An internal node whose left child is internal: `((a b) c)`.
    pub fn is_left_fragment(&self, id: VtreeId) -> bool {
        match self.node(id) {
            VtreeNode::Internal(left, _) => self.node(left).is_internal(),
            VtreeNode::Leaf(_) => false,
        }
    }

    /// An internal node whose right child is internal: `(a (b c))`.
    pub fn is_right_fragment(&self, id: VtreeId) -> bool {
        match self.node(id) {
            VtreeNode::Internal(_, right) => self.node(right).is_internal(),
            VtreeNode::Leaf(_) => false,
        }
    }

    /// Nodes in in-order (position order).
    pub fn in_order(&self) -> &[VtreeId] {
        &self.in_order
    }

    /// Internal nodes, children before parents.
    pub fn internal_post_order(&self) -> Vec<VtreeId> {
        let mut result = Vec::new();
        self.post_order_rec(self.root, &mut result);
        result
    }

    fn post_order_rec(&self, id: VtreeId, result: &mut Vec<VtreeId>) {
        if let VtreeNode::Internal(left, right) = self.node(id) {
            self.post_order_rec(left, result);
            self.post_order_rec(right, result);
            result.push(id);
        }
    }

    /// The path from `id` up to the root, starting with `id`.
    pub fn path_to_root(&self, id: VtreeId) -> Vec<VtreeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Parenthesized shape, e.g. `(x1 (x2 x3))`.
    pub fn to_shape_string(&self) -> String {
        let mut s = String::new();
        self.shape_rec(self.root, &mut s);
        s
    }

    fn shape_rec(&self, id: VtreeId, s: &mut String) {
        match self.node(id) {
            VtreeNode::Leaf(var) => s.push_str(&var.to_string()),
            VtreeNode::Internal(left, right) => {
                s.push('(');
                self.shape_rec(left, s);
                s.push(' ');
                self.shape_rec(right, s);
                s.push(')');
            }
        }
    }
}

impl Display for VtreeRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_shape_string())
    }
}
