use std::collections::BTreeMap;
use std::fmt;

use argus_cpa::{AbstractState, HasTop, Lattice};

use crate::Interval;

/// A map from variables to the interval of values they may hold.
///
/// Variables without an entry are unconstrained. Entries are never top and
/// never empty: a state that would bind a variable to the empty interval is
/// infeasible and is not represented at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalState {
    values: BTreeMap<String, Interval>,
}

impl IntervalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The interval of `var`; top if the state says nothing about it.
    pub fn get(&self, var: &str) -> Interval {
        self.values.get(var).copied().unwrap_or_else(Interval::top)
    }

    /// Bind `var` to `value`. Returns `false` (and leaves the state unchanged)
    /// if `value` is empty.
    pub fn set(&mut self, var: &str, value: Interval) -> bool {
        if value.is_empty() {
            return false;
        }
        if value.is_top() {
            self.values.remove(var);
        } else {
            self.values.insert(var.to_string(), value);
        }
        true
    }

    pub fn with(mut self, var: &str, value: Interval) -> Option<Self> {
        self.set(var, value).then_some(self)
    }

    pub fn forget(&mut self, var: &str) {
        self.values.remove(var);
    }

    /// Drop every binding `keep` rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.values.retain(|var, _| keep(var));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Interval)> {
        self.values.iter().map(|(var, value)| (var.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pointwise widening; variables bound on only one side become unconstrained.
    pub fn widen(&self, next: &Self) -> Self {
        self.combine(next, |a, b| a.widen(b))
    }

    fn combine(&self, other: &Self, f: impl Fn(&Interval, &Interval) -> Interval) -> Self {
        let mut out = IntervalState::new();
        for (var, a) in &self.values {
            if let Some(b) = other.values.get(var) {
                out.set(var, f(a, b));
            }
        }
        out
    }
}

impl Lattice for IntervalState {
    fn join(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a.join(b))
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        other
            .values
            .iter()
            .all(|(var, bound)| self.get(var).is_subseteq(bound))
    }
}

impl HasTop for IntervalState {
    fn top() -> Self {
        IntervalState::new()
    }
}

impl AbstractState for IntervalState {}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var} in {value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_test_utils::lattice::{assert_lattice_laws, assert_top_laws, assert_widening_laws};

    fn state(bindings: &[(&str, Interval)]) -> IntervalState {
        let mut s = IntervalState::new();
        for (var, value) in bindings {
            assert!(s.set(var, *value));
        }
        s
    }

    fn samples() -> Vec<IntervalState> {
        vec![
            state(&[]),
            state(&[("x", Interval::constant(0))]),
            state(&[("x", Interval::new(0, 5))]),
            state(&[("x", Interval::constant(0)), ("y", Interval::constant(1))]),
            state(&[("y", Interval::half_bounded_below(0))]),
            state(&[("x", Interval::new(-3, 3)), ("y", Interval::new(1, 2))]),
        ]
    }

    #[test]
    fn interval_state_lattice_laws() {
        let elements = samples();
        assert_lattice_laws(&elements);
        assert_top_laws(&elements);
    }

    #[test]
    fn top_bindings_are_not_stored() {
        let mut s = state(&[("x", Interval::constant(1))]);
        assert!(s.set("x", Interval::top()));
        assert!(s.is_empty());
        assert!(!s.set("x", Interval::bottom_interval()));
    }

    #[test]
    fn join_drops_one_sided_bindings() {
        let a = state(&[("x", Interval::constant(1)), ("y", Interval::constant(0))]);
        let b = state(&[("x", Interval::constant(2))]);
        assert_eq!(a.join(&b), state(&[("x", Interval::new(1, 2))]));
        assert!(a.is_subseteq(&a.join(&b)));
        assert!(b.is_subseteq(&a.join(&b)));
    }

    #[test]
    fn widen_extrapolates_pointwise() {
        let a = state(&[("i", Interval::constant(0))]);
        let b = state(&[("i", Interval::new(0, 1))]);
        assert_eq!(a.widen(&b), state(&[("i", Interval::half_bounded_below(0))]));
        assert_eq!(a.to_string(), "{i in [0, 0]}");
    }

    #[test]
    fn widening_is_an_upper_bound() {
        assert_widening_laws(&samples(), IntervalState::widen);
    }
}
