//! Memoization of apply results.
//!
//! Keys are commutative: `(op, a, b)` and `(op, b, a)` hit the same entry.
//! Every vtree stack frame owns its own cache, because the shape of an apply
//! result depends on the vtree it was computed under.

use std::collections::HashMap;

use crate::reference::Ref;
use crate::types::Op;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ApplyKey {
    op: Op,
    a: Ref,
    b: Ref,
}

impl ApplyKey {
    pub fn new(op: Op, a: Ref, b: Ref) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { op, a, b }
    }
}

/// A cache backed by [HashMap], counting hits and misses.
#[derive(Debug, Default)]
pub struct ApplyCache {
    map: HashMap<ApplyKey, Ref>,
    hits: usize,
    misses: usize,
}

impl ApplyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Resets the hit and miss counters to earlier values.
    pub fn restore_counts(&mut self, hits: usize, misses: usize) {
        self.hits = hits;
        self.misses = misses;
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    #[inline]
    pub fn get(&mut self, key: &ApplyKey) -> Option<Ref> {
        match self.map.get(key) {
            Some(&v) => {
                self.hits += 1;
                Some(v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    #[inline]
    pub fn insert(&mut self, key: ApplyKey, value: Ref) {
        self.map.insert(key, value);
    }
}
