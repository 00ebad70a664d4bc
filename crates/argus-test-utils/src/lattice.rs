//! Assertion helpers for verifying lattice algebraic laws.
//!
//! These check properties over a given set of sample elements and collect all
//! violations into a single report, so you can see every failing law at once
//! rather than fixing them one at a time.
//!
//! # Example
//!
//! ```
//! use argus_test_utils::UnitState;
//! use argus_test_utils::lattice::assert_bounded_lattice_laws;
//!
//! // Pass representative elements from your lattice.
//! // Bottom and top are tested automatically.
//! assert_bounded_lattice_laws(&[UnitState]);
//! ```

use std::fmt::{Debug, Write};

use argus_cpa::{HasBottom, HasTop, Lattice};

/// Collect violations into a `Vec<String>`, then panic with a combined report
/// if any were found.
fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} lattice law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Check that `join` is commutative, associative, idempotent, and an upper
/// bound of its arguments over the given elements.
pub fn assert_join_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_join_laws(elements, &mut violations);
    report(violations);
}

/// Check that `is_subseteq` is a partial order over the given elements:
/// reflexive, transitive, and antisymmetric up to `==`.
pub fn assert_order_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_order_laws(elements, &mut violations);
    report(violations);
}

/// Check that `a.is_subseteq(&b)` holds exactly when `a.join(&b) == b`.
///
/// Domains whose order deliberately ignores part of the state (for example,
/// counters that never block coverage) are preorders and fail this check;
/// use [`assert_order_laws`] and [`assert_join_laws`] for those.
pub fn assert_ordering_consistent<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_ordering_consistent(elements, &mut violations);
    report(violations);
}

/// Check join laws, order laws, and their consistency. All violations are
/// collected and reported together.
///
/// This is the main entry point for testing a [`Lattice`] implementation. Pass
/// a representative set of elements; the more diverse the set, the better the
/// coverage. For lattices that also implement [`HasBottom`] and [`HasTop`], use
/// [`assert_bounded_lattice_laws`] instead.
pub fn assert_lattice_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_join_laws(elements, &mut violations);
    check_order_laws(elements, &mut violations);
    check_ordering_consistent(elements, &mut violations);
    report(violations);
}

/// Check that `widen(previous, next)` is above both of its arguments for
/// every pair of elements.
pub fn assert_widening_laws<L, W>(elements: &[L], widen: W)
where
    L: Lattice + Debug,
    W: Fn(&L, &L) -> L,
{
    let mut violations = Vec::new();
    for a in elements {
        for b in elements {
            let w = widen(a, b);
            if !a.is_subseteq(&w) || !b.is_subseteq(&w) {
                violations.push(format!(
                    "widening not an upper bound: widen({a:?}, {b:?}) = {w:?}"
                ));
            }
        }
    }
    report(violations);
}

/// Check that `bottom()` is below every element and the identity of `join`.
pub fn assert_bottom_laws<L: HasBottom + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_bottom_laws(elements, &mut violations);
    report(violations);
}

/// Check that `top()` is above every element and absorbs `join`.
pub fn assert_top_laws<L: HasTop + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_top_laws(elements, &mut violations);
    report(violations);
}

/// Check all lattice laws plus bottom and top element laws. Bottom and top
/// are added to the sample automatically.
pub fn assert_bounded_lattice_laws<L: HasBottom + HasTop + PartialEq + Debug + Clone>(
    elements: &[L],
) {
    let mut sample = elements.to_vec();
    sample.push(L::bottom());
    sample.push(L::top());
    let mut violations = Vec::new();
    check_join_laws(&sample, &mut violations);
    check_order_laws(&sample, &mut violations);
    check_ordering_consistent(&sample, &mut violations);
    check_bottom_laws(&sample, &mut violations);
    check_top_laws(&sample, &mut violations);
    report(violations);
}

// ---- internal helpers that push violations instead of panicking ----

fn check_join_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        // idempotent
        if a.join(a) != *a {
            v.push(format!("join not idempotent: {a:?}.join({a:?}) != {a:?}"));
        }
        for b in elements {
            // commutative
            if a.join(b) != b.join(a) {
                v.push(format!(
                    "join not commutative: {a:?}.join({b:?}) != {b:?}.join({a:?})"
                ));
            }
            // upper bound
            let j = a.join(b);
            if !a.is_subseteq(&j) || !b.is_subseteq(&j) {
                v.push(format!(
                    "join not an upper bound: {a:?}.join({b:?}) = {j:?}"
                ));
            }
            // associative
            for c in elements {
                if a.join(b).join(c) != a.join(&b.join(c)) {
                    v.push(format!(
                        "join not associative: ({a:?}.join({b:?})).join({c:?}) != {a:?}.join({b:?}.join({c:?}))"
                    ));
                }
            }
        }
    }
}

fn check_order_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        if !a.is_subseteq(a) {
            v.push(format!("order not reflexive: {a:?}.is_subseteq({a:?}) = false"));
        }
        for b in elements {
            for c in elements {
                if a.is_subseteq(b) && b.is_subseteq(c) && !a.is_subseteq(c) {
                    v.push(format!(
                        "order not transitive: {a:?} <= {b:?} <= {c:?} but not {a:?} <= {c:?}"
                    ));
                }
            }
        }
    }
}

fn check_ordering_consistent<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            let sub = a.is_subseteq(b);
            let join_agrees = a.join(b) == *b;
            if sub != join_agrees {
                v.push(format!(
                    "ordering inconsistent with join: {a:?}.is_subseteq({b:?}) = {sub}, \
                     but {a:?}.join({b:?}) == {b:?} is {join_agrees}"
                ));
            }
            if sub && b.is_subseteq(a) && a != b {
                v.push(format!(
                    "order not antisymmetric: {a:?} and {b:?} are mutually below each other"
                ));
            }
        }
    }
}

fn check_bottom_laws<L: HasBottom + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let bot = L::bottom();
    for x in elements {
        if !bot.is_subseteq(x) {
            v.push(format!(
                "bottom not below element: bottom().is_subseteq({x:?}) = false"
            ));
        }
        if bot.join(x) != *x {
            v.push(format!(
                "bottom identity violated: bottom().join({x:?}) != {x:?}"
            ));
        }
    }
}

fn check_top_laws<L: HasTop + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let top = L::top();
    for x in elements {
        if !x.is_subseteq(&top) {
            v.push(format!(
                "element not below top: {x:?}.is_subseteq(top()) = false"
            ));
        }
        if top.join(x) != top {
            v.push(format!(
                "top annihilation violated: top().join({x:?}) != top()"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitState;

    #[test]
    fn unit_state_lattice_laws() {
        assert_bounded_lattice_laws(&[UnitState]);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Broken(u8);

    impl Lattice for Broken {
        fn join(&self, other: &Self) -> Self {
            Broken(self.0.min(other.0))
        }

        fn is_subseteq(&self, other: &Self) -> bool {
            self.0 <= other.0
        }
    }

    #[test]
    #[should_panic(expected = "join not an upper bound")]
    fn broken_join_is_reported() {
        assert_join_laws(&[Broken(1), Broken(2)]);
    }

    #[test]
    #[should_panic(expected = "widening not an upper bound")]
    fn a_shrinking_widening_is_reported() {
        assert_widening_laws(&[Broken(1), Broken(2)], |a, b| a.join(b));
    }
}
