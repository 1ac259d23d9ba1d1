use std::fmt::{self, Display};
use std::rc::Rc;

use crate::reference::Ref;
use crate::types::Var;
use crate::vtree::VtreeId;

/// A `(prime, sub)` pair of a decomposition.
///
/// Ordering is by `sub` first: the element sets stored in decompositions are
/// sorted this way, which puts ⊥ and ⊤ subs at the front.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Element {
    pub prime: Ref,
    pub sub: Ref,
}

impl Element {
    pub const fn new(prime: Ref, sub: Ref) -> Self {
        Self { prime, sub }
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.sub, self.prime).cmp(&(other.sub, other.prime))
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.prime, self.sub)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SddNode {
    /// ⊤ or ⊥. Not anchored at any vtree node.
    Trivial(bool),
    /// A variable or its negation, anchored at the variable's leaf.
    Literal { var: Var, phase: bool },
    /// A compressed, trimmed partition anchored at an internal vtree node.
    ///
    /// Elements are sorted by sub and all subs are distinct.
    Decomposition { vtree: VtreeId, elements: Rc<[Element]> },
}

impl SddNode {
    pub fn is_trivial(&self) -> bool {
        matches!(self, SddNode::Trivial(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, SddNode::Literal { .. })
    }

    pub fn is_decomposition(&self) -> bool {
        matches!(self, SddNode::Decomposition { .. })
    }

    /// Elements of a decomposition, empty for other nodes.
    pub fn elements(&self) -> &[Element] {
        match self {
            SddNode::Decomposition { elements, .. } => elements,
            _ => &[],
        }
    }
}

impl Display for SddNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SddNode::Trivial(true) => write!(f, "⊤"),
            SddNode::Trivial(false) => write!(f, "⊥"),
            SddNode::Literal { var, phase: true } => write!(f, "{}", var),
            SddNode::Literal { var, phase: false } => write!(f, "¬{}", var),
            SddNode::Decomposition { vtree, elements } => {
                write!(f, "[{}]{{", vtree)?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ∨ ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
        }
    }
}
