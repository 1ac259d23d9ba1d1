//! Products of partitions.
//!
//! Multiplying two partitions `{(p_i, s_i)}` and `{(q_j, t_j)}` over the same
//! vtree node yields `{(p_i ∧ q_j, s_i ∘ t_j) | p_i ∧ q_j ≠ ⊥}`. Three
//! shortcuts keep this far from quadratic in practice:
//!
//! - if one side contains a prime `p` and the other contains `¬p`, the
//!   product is linear;
//! - equal primes pair up with each other and with nothing else;
//! - a conjunction equal to one of its operands means that operand is
//!   contained in the other, which ends the scan for it.

use std::collections::HashMap;

use log::trace;

use crate::handler::{Cancelable, ComputationHandler};
use crate::node::Element;
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::types::Op;

impl Sdd {
    pub(crate) fn multiply(
        &self,
        left: &[Element],
        right: &[Element],
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Vec<Element>> {
        if let Some((i, j)) = self.find_complementary_primes(left, right) {
            trace!("multiply: complementary primes at ({}, {})", i, j);
            return self.multiply_complementary(left, right, i, j, op, handler);
        }

        let mut result = Vec::with_capacity(left.len() + right.len());
        let (common, left_rest, mut right_rest) = self.split_common_primes(left, right);
        for (a, b) in common {
            result.push(Element::new(a.prime, self.apply_rec(a.sub, b.sub, op, handler)?));
        }

        for a in left_rest {
            let mut k = 0;
            while k < right_rest.len() {
                let b = right_rest[k];
                let prime = self.apply_rec(a.prime, b.prime, Op::And, handler)?;
                if prime.is_false() {
                    k += 1;
                    continue;
                }
                result.push(Element::new(prime, self.apply_rec(a.sub, b.sub, op, handler)?));
                if prime == a.prime {
                    // a ⊆ b: no other b intersects a
                    break;
                }
                if prime == b.prime {
                    // b ⊆ a: no other a intersects b
                    right_rest.remove(k);
                } else {
                    k += 1;
                }
            }
        }

        Ok(result)
    }

    fn find_complementary_primes(&self, left: &[Element], right: &[Element]) -> Option<(usize, usize)> {
        for (i, a) in left.iter().enumerate() {
            if let Some(not_a) = self.known_negation(a.prime) {
                if let Some(j) = right.iter().position(|b| b.prime == not_a) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Product when `left[i].prime == ¬right[j].prime`.
    ///
    /// All other right primes lie inside `left[i].prime` and all other left
    /// primes lie inside `right[j].prime`.
    fn multiply_complementary(
        &self,
        left: &[Element],
        right: &[Element],
        i: usize,
        j: usize,
        op: Op,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Vec<Element>> {
        let mut result = Vec::with_capacity(left.len() + right.len() - 2);
        let (pivot_left, pivot_right) = (left[i], right[j]);
        for (k, b) in right.iter().enumerate() {
            if k != j {
                result.push(Element::new(b.prime, self.apply_rec(pivot_left.sub, b.sub, op, handler)?));
            }
        }
        for (k, a) in left.iter().enumerate() {
            if k != i {
                result.push(Element::new(a.prime, self.apply_rec(a.sub, pivot_right.sub, op, handler)?));
            }
        }
        Ok(result)
    }

    /// Splits off the pairs of elements with equal primes.
    ///
    /// Returns the pairs, then the unmatched left and right elements.
    #[allow(clippy::type_complexity)]
    fn split_common_primes(
        &self,
        left: &[Element],
        right: &[Element],
    ) -> (Vec<(Element, Element)>, Vec<Element>, Vec<Element>) {
        let threshold = self.config().hash_join_threshold;
        let mut matched = vec![false; right.len()];
        let mut common = Vec::new();
        let mut left_rest = Vec::new();

        if left.len() > threshold && right.len() > threshold {
            let index: HashMap<Ref, usize> = right.iter().enumerate().map(|(j, b)| (b.prime, j)).collect();
            for &a in left {
                match index.get(&a.prime) {
                    Some(&j) => {
                        matched[j] = true;
                        common.push((a, right[j]));
                    }
                    None => left_rest.push(a),
                }
            }
        } else {
            for &a in left {
                match right.iter().position(|b| b.prime == a.prime) {
                    Some(j) => {
                        matched[j] = true;
                        common.push((a, right[j]));
                    }
                    None => left_rest.push(a),
                }
            }
        }

        let right_rest = right
            .iter()
            .zip(matched)
            .filter(|(_, m)| !m)
            .map(|(&b, _)| b)
            .collect();
        (common, left_rest, right_rest)
    }

    /// Disjunctive product of partitions, starting from `{(⊤, ⊥)}`.
    ///
    /// With `compress`, the accumulator is compressed after every step, which
    /// bounds its size by the number of distinct subs.
    pub(crate) fn cartesian_product(
        &self,
        sets: Vec<Vec<Element>>,
        compress: bool,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<Vec<Element>> {
        let mut acc = vec![Element::new(Ref::TRUE, Ref::FALSE)];
        for set in sets {
            acc = self.multiply(&acc, &set, Op::Or, handler)?;
            if compress {
                acc = self.compress(acc, handler)?;
            }
        }
        Ok(acc)
    }
}
