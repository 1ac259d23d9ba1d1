//! Type-safe wrappers for SDD variables and Boolean operators.
//!
//! Variables are 1-indexed, like in DIMACS. They are stable across vtree
//! restructuring: a rotation changes where a variable sits in the vtree,
//! never its identity.
use std::fmt;

use crate::reference::Ref;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the signed literal of this variable with the given phase.
    pub fn lit(self, phase: bool) -> i32 {
        if phase {
            self.0 as i32
        } else {
            -(self.0 as i32)
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

impl From<u32> for Var {
    fn from(id: u32) -> Self {
        Var::new(id)
    }
}

/// A binary Boolean operator handled by apply.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    And,
    Or,
}

impl Op {
    /// The absorbing element: `x op zero == zero`.
    pub const fn zero(self) -> Ref {
        match self {
            Op::And => Ref::FALSE,
            Op::Or => Ref::TRUE,
        }
    }

    /// The identity element: `x op one == x`.
    pub const fn one(self) -> Ref {
        match self {
            Op::And => Ref::TRUE,
            Op::Or => Ref::FALSE,
        }
    }

    /// The dual operator (De Morgan).
    pub const fn dual(self) -> Self {
        match self {
            Op::And => Op::Or,
            Op::Or => Op::And,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::And => write!(f, "∧"),
            Op::Or => write!(f, "∨"),
        }
    }
}
