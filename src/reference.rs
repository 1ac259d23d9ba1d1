use std::fmt::{Display, Formatter};

/// Handle of an SDD node inside its [`Sdd`][crate::sdd::Sdd] manager.
///
/// Nodes are hash-consed, so two handles are equal iff they denote the same
/// Boolean function under the same vtree. SDDs have no complement edges:
/// the negation of a node is a separate node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(u32);

impl Ref {
    /// The constant ⊥.
    pub const FALSE: Self = Self(0);
    /// The constant ⊤.
    pub const TRUE: Self = Self(1);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the constant for the given Boolean value.
    pub const fn constant(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Return the index of the node in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_false(self) -> bool {
        self.0 == 0
    }

    pub const fn is_true(self) -> bool {
        self.0 == 1
    }

    pub const fn is_trivial(self) -> bool {
        self.0 <= 1
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::FALSE => write!(f, "⊥"),
            Self::TRUE => write!(f, "⊤"),
            Self(i) => write!(f, "@{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(Ref::FALSE.is_false());
        assert!(Ref::TRUE.is_true());
        assert!(Ref::FALSE.is_trivial());
        assert!(!Ref::new(2).is_trivial());
        assert_eq!(Ref::constant(true), Ref::TRUE);
        assert!(Ref::FALSE < Ref::TRUE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ref::FALSE.to_string(), "⊥");
        assert_eq!(Ref::TRUE.to_string(), "⊤");
        assert_eq!(Ref::new(7).to_string(), "@7");
    }
}
