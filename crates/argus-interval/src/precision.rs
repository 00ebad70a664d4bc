use std::collections::BTreeSet;
use std::fmt;

/// Which variables the interval analysis keeps bounds for.
///
/// Untracked variables are always unconstrained. Refinement produces a new
/// precision with more tracked variables; precisions are never mutated in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalPrecision {
    /// `None` tracks every variable.
    tracked: Option<BTreeSet<String>>,
}

impl IntervalPrecision {
    pub fn all() -> Self {
        Self { tracked: None }
    }

    pub fn none() -> Self {
        Self::only(std::iter::empty::<String>())
    }

    pub fn only<I, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            tracked: Some(vars.into_iter().map(Into::into).collect()),
        }
    }

    pub fn tracks(&self, var: &str) -> bool {
        self.tracked.as_ref().is_none_or(|vars| vars.contains(var))
    }

    pub fn tracks_all(&self) -> bool {
        self.tracked.is_none()
    }

    /// The explicitly tracked variables, or `None` when everything is tracked.
    pub fn tracked(&self) -> Option<&BTreeSet<String>> {
        self.tracked.as_ref()
    }

    /// This precision extended by `var`.
    pub fn with_variable(&self, var: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Some(vars) = &mut next.tracked {
            vars.insert(var.into());
        }
        next
    }

    /// Whether `self` tracks every variable `other` tracks.
    pub fn refines(&self, other: &Self) -> bool {
        match (&self.tracked, &other.tracked) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => theirs.is_subset(mine),
        }
    }
}

impl fmt::Display for IntervalPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tracked {
            None => write!(f, "*"),
            Some(vars) => {
                write!(f, "{{")?;
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{var}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
