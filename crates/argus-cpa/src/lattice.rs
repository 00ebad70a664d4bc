/// A join-semilattice with a decidable order.
///
/// `a.is_subseteq(b)` reads "`a` is at least as precise as `b`": every
/// concrete state described by `a` is also described by `b`. The reachability
/// engine relies on these laws (checked for every shipped domain in tests):
///
/// - `is_subseteq` is reflexive and transitive. It is usually antisymmetric
///   as well, but a preorder is allowed for domains that carry information
///   without distinguishing states by it;
/// - `join` is an upper bound of both arguments, idempotent, and commutative.
pub trait Lattice {
    fn join(&self, other: &Self) -> Self;
    fn is_subseteq(&self, other: &Self) -> bool;
}

/// A lattice with a least element (no concrete state).
pub trait HasBottom: Lattice {
    fn bottom() -> Self;

    fn is_bottom(&self) -> bool
    where
        Self: Sized,
    {
        self.is_subseteq(&Self::bottom())
    }
}

/// A lattice with a greatest element (every concrete state).
pub trait HasTop: Lattice {
    fn top() -> Self;
}
