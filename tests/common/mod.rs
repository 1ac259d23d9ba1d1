#![allow(dead_code)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use sdd_rs::eval::Assignment;
use sdd_rs::reference::Ref;
use sdd_rs::sdd::Sdd;

/// Small Boolean formulas used as an oracle.
#[derive(Debug, Clone)]
pub enum Formula {
    Const(bool),
    Var(u32),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Xor(Box<Formula>, Box<Formula>),
}

impl Formula {
    /// A random formula over `x1..=x{num_vars}`.
    pub fn random(rng: &mut impl Rng, num_vars: u32, depth: usize) -> Self {
        if depth == 0 || rng.random_bool(0.15) {
            return if rng.random_bool(0.05) {
                Formula::Const(rng.random_bool(0.5))
            } else {
                Formula::Var(rng.random_range(1..=num_vars))
            };
        }
        let a = Box::new(Self::random(rng, num_vars, depth - 1));
        match rng.random_range(0..7) {
            0 => Formula::Not(a),
            1 | 2 => Formula::And(a, Box::new(Self::random(rng, num_vars, depth - 1))),
            3 | 4 => Formula::Or(a, Box::new(Self::random(rng, num_vars, depth - 1))),
            _ => Formula::Xor(a, Box::new(Self::random(rng, num_vars, depth - 1))),
        }
    }

    /// Value under `bits`, where bit `i - 1` holds `x{i}`.
    pub fn eval(&self, bits: u32) -> bool {
        match self {
            Formula::Const(b) => *b,
            Formula::Var(v) => bits & (1 << (v - 1)) != 0,
            Formula::Not(a) => !a.eval(bits),
            Formula::And(a, b) => a.eval(bits) && b.eval(bits),
            Formula::Or(a, b) => a.eval(bits) || b.eval(bits),
            Formula::Xor(a, b) => a.eval(bits) != b.eval(bits),
        }
    }

    pub fn build(&self, sdd: &Sdd) -> Ref {
        match self {
            Formula::Const(b) => Ref::constant(*b),
            Formula::Var(v) => sdd.variable(*v),
            Formula::Not(a) => sdd.negate(a.build(sdd)),
            Formula::And(a, b) => sdd.and(a.build(sdd), b.build(sdd)),
            Formula::Or(a, b) => sdd.or(a.build(sdd), b.build(sdd)),
            Formula::Xor(a, b) => sdd.xor(a.build(sdd), b.build(sdd)),
        }
    }

    pub fn count_models(&self, num_vars: u32) -> u64 {
        (0..1u32 << num_vars).filter(|&bits| self.eval(bits)).count() as u64
    }
}

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// The assignment of `x1..=x{num_vars}` encoded by `bits`.
pub fn assignment(bits: u32, num_vars: u32) -> Assignment {
    (1..=num_vars as i32)
        .map(|i| if bits & (1 << (i - 1)) != 0 { i } else { -i })
        .collect()
}

/// Whether `f` and `g` agree on every assignment of `x1..=x{num_vars}`.
pub fn equivalent(sdd: &Sdd, f: Ref, g: Ref, num_vars: u32) -> bool {
    (0..1u32 << num_vars).all(|bits| {
        let a = assignment(bits, num_vars);
        sdd.evaluate(f, &a) == sdd.evaluate(g, &a)
    })
}

/// Whether `f` denotes `formula`.
pub fn denotes(sdd: &Sdd, f: Ref, formula: &Formula, num_vars: u32) -> bool {
    (0..1u32 << num_vars).all(|bits| sdd.evaluate(f, &assignment(bits, num_vars)) == formula.eval(bits))
}

/// A manager for each vtree family over `num_vars` variables.
pub fn managers(num_vars: u32) -> Vec<(&'static str, Sdd)> {
    use sdd_rs::types::Var;
    use sdd_rs::vtree::VtreeStore;

    let vars: Vec<Var> = (1..=num_vars).map(Var::new).collect();
    let mut right = VtreeStore::new();
    let right_root = right.right_linear(&vars);
    let mut left = VtreeStore::new();
    let left_root = left.left_linear(&vars);
    vec![
        ("balanced", Sdd::new(num_vars)),
        ("right-linear", Sdd::from_vtree(right, right_root)),
        ("left-linear", Sdd::from_vtree(left, left_root)),
    ]
}
