//! # sdd-rs: Sentential Decision Diagrams in Rust
//!
//! **`sdd-rs`** is a manager-centric library for **Sentential Decision Diagrams (SDDs)**,
//! a canonical representation of Boolean functions that generalizes OBDDs.
//!
//! ## What is an SDD?
//!
//! An SDD is shaped by a *vtree*: a full binary tree whose leaves are the variables.
//! A node normalized for an internal vtree node `v` is a set of elements `(prime, sub)`:
//! the primes are functions over the left subtree of `v` that form a *partition*
//! (pairwise disjoint, exhaustive, none false), and the subs are functions over the right subtree.
//! The node denotes `(p₁ ∧ s₁) ∨ … ∨ (pₙ ∧ sₙ)`.
//!
//! Keeping all partitions **compressed** (distinct subs) and **trimmed** makes SDDs canonical:
//! for a fixed vtree, each Boolean function has exactly one node.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all operations go through the [`Sdd`][crate::sdd::Sdd] manager,
//!   which owns the nodes, the unique table and the apply cache.
//! - **Apply**: conjunction and disjunction with memoization, plus the usual connectives.
//! - **Vtree Stack**: vtree edits are pushed speculatively and popped by a scope guard,
//!   see [`VtreeShadow`][crate::sdd::VtreeShadow].
//! - **Transformations**: rotations and swaps of the vtree translate existing nodes,
//!   one node at a time or all pinned roots at once.
//! - **Dynamic Minimization**: local search over vtree fragments with pluggable strategies.
//! - **Cancellation**: every long-running operation polls a [`ComputationHandler`][crate::handler::ComputationHandler].
//!
//! ## Basic Usage
//!
//! ```rust
//! use sdd_rs::eval::Assignment;
//! use sdd_rs::sdd::Sdd;
//!
//! // A manager over x1..x4 with a balanced vtree
//! let sdd = Sdd::new(4);
//!
//! let x1 = sdd.variable(1);
//! let x2 = sdd.variable(2);
//! let x3 = sdd.variable(3);
//!
//! // f = (x1 ∧ x2) ∨ ¬x3
//! let f = sdd.or(sdd.and(x1, x2), sdd.negate(x3));
//!
//! assert!(sdd.evaluate(f, &Assignment::from_lits([1, 2, 3])));
//! assert!(!sdd.evaluate(f, &Assignment::from_lits([1, -2, 3])));
//! assert_eq!(sdd.model_count(f), num_bigint::BigUint::from(10u32));
//! ```
//!
//! ## Minimization
//!
//! ```rust
//! use sdd_rs::handler::{NopHandler, UnboundedSearch};
//! use sdd_rs::sdd::Sdd;
//!
//! let sdd = Sdd::parse_vtree("(1 (2 (3 4)))").unwrap();
//! let f = sdd.or(sdd.cube([1, 3]), sdd.cube([2, 4]));
//!
//! let result = sdd.minimize(&[f], &UnboundedSearch, &mut NopHandler).result().unwrap();
//! let g = result.translate(f);
//! assert!(sdd.size_of(g) <= sdd.size_of(f));
//! ```
//!
//! ## Core Components
//!
//! - **[`sdd`]**: the manager, the vtree stack and node storage.
//! - **[`vtree`]** and **[`restructure`]**: vtrees and their rotations and swaps.
//! - **[`transform`]** and **[`plan`]**: translation of nodes across vtree edits.
//! - **[`fragment`]**, **[`minimize`]** and **[`strategy`]**: dynamic minimization.
//! - **[`handler`]**: cooperative cancellation.

pub mod apply;
pub mod cache;
pub mod canonical;
pub mod eval;
pub mod fragment;
pub mod handler;
pub mod minimize;
pub mod multiply;
pub mod node;
pub mod plan;
pub mod quantify;
pub mod reference;
pub mod restrict;
pub mod restructure;
pub mod sdd;
pub mod size;
pub mod strategy;
pub mod transform;
pub mod types;
pub mod validate;
pub mod vtree;
