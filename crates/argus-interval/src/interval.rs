use std::fmt;

use argus_cfa::CmpOp;
use argus_cpa::{HasBottom, HasTop, Lattice};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    NegInf,
    Finite(i64),
    PosInf,
}

impl Bound {
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, b) | (b, Bound::PosInf) => b,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.min(b)),
        }
    }

    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::NegInf, b) | (b, Bound::NegInf) => b,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.max(b)),
        }
    }

    pub fn less_than(self, other: Self) -> bool {
        match (self, other) {
            (Bound::NegInf, Bound::NegInf) => false,
            (Bound::NegInf, _) => true,
            (_, Bound::NegInf) => false,
            (Bound::PosInf, _) => false,
            (_, Bound::PosInf) => true,
            (Bound::Finite(a), Bound::Finite(b)) => a < b,
        }
    }

    pub fn less_eq(self, other: Self) -> bool {
        self == other || self.less_than(other)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        match (self, other) {
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => Bound::NegInf,
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_add(b)),
        }
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        match (self, other) {
            (Bound::NegInf, Bound::NegInf) | (Bound::PosInf, Bound::PosInf) => Bound::NegInf,
            (Bound::NegInf, _) | (_, Bound::PosInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::NegInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_sub(b)),
        }
    }

    pub fn saturating_mul(self, other: Self) -> Self {
        match (self, other) {
            (Bound::Finite(0), _) | (_, Bound::Finite(0)) => Bound::Finite(0),
            (Bound::NegInf, Bound::NegInf) | (Bound::PosInf, Bound::PosInf) => Bound::PosInf,
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => Bound::NegInf,
            (Bound::NegInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::NegInf) => {
                if b > 0 {
                    Bound::NegInf
                } else {
                    Bound::PosInf
                }
            }
            (Bound::PosInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::PosInf) => {
                if b > 0 {
                    Bound::PosInf
                } else {
                    Bound::NegInf
                }
            }
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_mul(b)),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::PosInf => Bound::NegInf,
            Bound::Finite(v) => Bound::Finite(v.saturating_neg()),
        }
    }

    /// Shift a finite bound by `delta`; infinite bounds stay put.
    fn offset(self, delta: i64) -> Self {
        match self {
            Bound::Finite(v) => Bound::Finite(v.saturating_add(delta)),
            other => other,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::Finite(v) => write!(f, "{v}"),
            Bound::PosInf => write!(f, "+inf"),
        }
    }
}

/// An interval [lo, hi] where lo > hi represents bottom (empty).
///
/// Every constructor returns the canonical empty interval, so two empty
/// intervals always compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub lo: Bound,
    pub hi: Bound,
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self::from_bounds(Bound::Finite(lo), Bound::Finite(hi))
    }

    pub fn from_bounds(lo: Bound, hi: Bound) -> Self {
        if lo == Bound::PosInf || hi == Bound::NegInf || hi.less_than(lo) {
            Self::bottom_interval()
        } else {
            Interval { lo, hi }
        }
    }

    pub fn constant(v: i64) -> Self {
        Interval::new(v, v)
    }

    pub fn bottom_interval() -> Self {
        Interval {
            lo: Bound::PosInf,
            hi: Bound::NegInf,
        }
    }

    pub fn half_bounded_above(hi: i64) -> Self {
        Interval {
            lo: Bound::NegInf,
            hi: Bound::Finite(hi),
        }
    }

    pub fn half_bounded_below(lo: i64) -> Self {
        Interval {
            lo: Bound::Finite(lo),
            hi: Bound::PosInf,
        }
    }

    pub fn is_empty(&self) -> bool {
        match (self.lo, self.hi) {
            (Bound::PosInf, _) => true,
            (_, Bound::NegInf) => true,
            (Bound::Finite(lo), Bound::Finite(hi)) => lo > hi,
            (Bound::NegInf, _) => false,
            (_, Bound::PosInf) => false,
        }
    }

    pub fn is_top(&self) -> bool {
        self.lo == Bound::NegInf && self.hi == Bound::PosInf
    }

    pub fn contains(&self, v: i64) -> bool {
        self.lo.less_eq(Bound::Finite(v)) && Bound::Finite(v).less_eq(self.hi)
    }

    /// The single value this interval holds, if it is a singleton.
    pub fn as_constant(&self) -> Option<i64> {
        match (self.lo, self.hi) {
            (Bound::Finite(lo), Bound::Finite(hi)) if lo == hi => Some(lo),
            _ => None,
        }
    }

    pub fn meet(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom_interval();
        }
        Self::from_bounds(self.lo.max(other.lo), self.hi.min(other.hi))
    }

    /// Standard interval widening: any bound that grew jumps to infinity.
    pub fn widen(&self, next: &Self) -> Self {
        if self.is_empty() {
            return *next;
        }
        if next.is_empty() {
            return *self;
        }
        let lo = if next.lo.less_than(self.lo) {
            Bound::NegInf
        } else {
            self.lo
        };
        let hi = if self.hi.less_than(next.hi) {
            Bound::PosInf
        } else {
            self.hi
        };
        Interval { lo, hi }
    }

    pub fn narrow(&self, next: &Self) -> Self {
        if self.is_empty() || next.is_empty() {
            return *self;
        }
        let lo = match self.lo {
            Bound::NegInf => next.lo,
            other => other,
        };
        let hi = match self.hi {
            Bound::PosInf => next.hi,
            other => other,
        };
        Interval { lo, hi }
    }

    /// The values `x` of `self` for which `x op y` holds for some `y` in `other`.
    pub fn restrict(&self, op: CmpOp, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom_interval();
        }
        let bound = match op {
            CmpOp::Eq => *other,
            CmpOp::Lt => Self::from_bounds(Bound::NegInf, other.hi.offset(-1)),
            CmpOp::Le => Self::from_bounds(Bound::NegInf, other.hi),
            CmpOp::Gt => Self::from_bounds(other.lo.offset(1), Bound::PosInf),
            CmpOp::Ge => Self::from_bounds(other.lo, Bound::PosInf),
            CmpOp::Ne => {
                let Some(c) = other.as_constant() else {
                    return *self;
                };
                let mut lo = self.lo;
                let mut hi = self.hi;
                if lo == Bound::Finite(c) {
                    lo = lo.offset(1);
                }
                if hi == Bound::Finite(c) {
                    hi = hi.offset(-1);
                }
                return Self::from_bounds(lo, hi);
            }
        };
        self.meet(&bound)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "bottom");
        }
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

pub fn interval_add(a: &Interval, b: &Interval) -> Interval {
    if a.is_empty() || b.is_empty() {
        return Interval::bottom_interval();
    }
    Interval {
        lo: a.lo.saturating_add(b.lo),
        hi: a.hi.saturating_add(b.hi),
    }
}

pub fn interval_sub(a: &Interval, b: &Interval) -> Interval {
    if a.is_empty() || b.is_empty() {
        return Interval::bottom_interval();
    }
    Interval {
        lo: a.lo.saturating_sub(b.hi),
        hi: a.hi.saturating_sub(b.lo),
    }
}

pub fn interval_mul(a: &Interval, b: &Interval) -> Interval {
    if a.is_empty() || b.is_empty() {
        return Interval::bottom_interval();
    }
    let products = [
        a.lo.saturating_mul(b.lo),
        a.lo.saturating_mul(b.hi),
        a.hi.saturating_mul(b.lo),
        a.hi.saturating_mul(b.hi),
    ];
    let lo = products.iter().copied().fold(Bound::PosInf, Bound::min);
    let hi = products.iter().copied().fold(Bound::NegInf, Bound::max);
    Interval { lo, hi }
}

pub fn interval_neg(a: &Interval) -> Interval {
    if a.is_empty() {
        return Interval::bottom_interval();
    }
    Interval {
        lo: a.hi.negate(),
        hi: a.lo.negate(),
    }
}

impl Lattice for Interval {
    fn join(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        if self.is_empty() {
            return true;
        }
        if other.is_empty() {
            return false;
        }
        other.lo.less_eq(self.lo) && self.hi.less_eq(other.hi)
    }
}

impl HasBottom for Interval {
    fn bottom() -> Self {
        Interval::bottom_interval()
    }
}

impl HasTop for Interval {
    fn top() -> Self {
        Interval {
            lo: Bound::NegInf,
            hi: Bound::PosInf,
        }
    }
}

impl std::ops::Add for Interval {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        interval_add(&self, &rhs)
    }
}

impl std::ops::Sub for Interval {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        interval_sub(&self, &rhs)
    }
}

impl std::ops::Mul for Interval {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        interval_mul(&self, &rhs)
    }
}

impl std::ops::Neg for Interval {
    type Output = Self;
    fn neg(self) -> Self {
        interval_neg(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_test_utils::lattice::assert_bounded_lattice_laws;

    #[test]
    fn interval_lattice_laws() {
        let elements = vec![
            Interval::bottom(),
            Interval::constant(0),
            Interval::constant(42),
            Interval::new(0, 10),
            Interval::new(-5, 5),
            Interval::new(3, 7),
            Interval::new(-100, 100),
            Interval::half_bounded_above(0),
            Interval::half_bounded_below(1),
            Interval::top(),
        ];
        assert_bounded_lattice_laws(&elements);
    }

    #[test]
    fn empty_intervals_are_canonical() {
        assert_eq!(Interval::new(5, 3), Interval::bottom());
        assert_eq!(
            Interval::new(0, 3).meet(&Interval::new(5, 9)),
            Interval::bottom()
        );
        assert_eq!(Interval::constant(0).restrict(CmpOp::Ne, &Interval::constant(0)), Interval::bottom());
    }

    #[test]
    fn arithmetic_saturates_at_infinity() {
        let a = Interval::half_bounded_below(1);
        let b = Interval::new(-2, 3);
        assert_eq!(a + b, Interval::half_bounded_below(-1));
        assert_eq!(-a, Interval::half_bounded_above(-1));
        assert_eq!(Interval::new(-2, 3) * Interval::new(4, 5), Interval::new(-10, 15));
        assert_eq!(Interval::new(0, 4) - Interval::new(1, 2), Interval::new(-2, 3));
    }

    #[test]
    fn widening_jumps_unstable_bounds() {
        let prev = Interval::new(0, 1);
        let next = Interval::new(0, 2);
        assert_eq!(prev.widen(&next), Interval::half_bounded_below(0));
        assert_eq!(prev.widen(&prev), prev);
        assert!(next.is_subseteq(&prev.widen(&next)));
        assert_eq!(
            Interval::half_bounded_below(0).narrow(&Interval::new(0, 10)),
            Interval::new(0, 10)
        );
    }

    #[test]
    fn restrict_follows_the_comparison() {
        let x = Interval::new(0, 10);
        let five = Interval::constant(5);
        assert_eq!(x.restrict(CmpOp::Lt, &five), Interval::new(0, 4));
        assert_eq!(x.restrict(CmpOp::Le, &five), Interval::new(0, 5));
        assert_eq!(x.restrict(CmpOp::Gt, &five), Interval::new(6, 10));
        assert_eq!(x.restrict(CmpOp::Ge, &five), Interval::new(5, 10));
        assert_eq!(x.restrict(CmpOp::Eq, &five), five);
        assert_eq!(x.restrict(CmpOp::Ne, &five), x);
        assert_eq!(x.restrict(CmpOp::Ne, &Interval::constant(0)), Interval::new(1, 10));
        assert!(x.restrict(CmpOp::Gt, &Interval::constant(10)).is_empty());
    }

    #[test]
    fn display_shows_bounds() {
        assert_eq!(Interval::half_bounded_below(3).to_string(), "[3, +inf]");
        assert_eq!(Interval::bottom().to_string(), "bottom");
    }
}
