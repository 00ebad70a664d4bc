use std::fmt;

use crate::arg::ArgPath;
use crate::{AbortReason, AnalysisError, NodeId, ReachabilityStatistics, ReachedSet};

/// A path from an initial state to a target state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counterexample {
    target: NodeId,
    path: ArgPath,
    violations: Vec<String>,
    trace: Vec<String>,
}

impl Counterexample {
    /// Extract the ARG path to `target` and render it against the CFA.
    pub fn extract(reached: &ReachedSet, target: NodeId) -> Result<Self, AnalysisError> {
        let path = reached.arg().path_to(target)?;
        let violations = reached
            .state(target)
            .map(|s| s.violations())
            .unwrap_or_default();
        let trace = path.render(reached.arg(), reached.cfa());
        Ok(Self {
            target,
            path,
            violations,
            trace,
        })
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn path(&self) -> &ArgPath {
        &self.path
    }

    /// Descriptions of the violated properties.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// The path rendered one edge per line.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "counterexample to node {}", self.target)?;
        if !self.violations.is_empty() {
            write!(f, " ({})", self.violations.join(", "))?;
        }
        for line in &self.trace {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Why the analysis could neither prove nor refute the property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnknownReason {
    Cancelled,
    /// The iteration budget ran out.
    ResourceExhausted,
    /// Precision adjustment cut exploration short.
    Incomplete { cutoffs: Vec<String> },
    /// A component failed on an edge.
    TransferFailure(String),
    /// The refiner could not decide the last counterexample.
    RefinementFailed {
        message: String,
        counterexample: Option<Counterexample>,
    },
    /// The refinement budget ran out with a spurious counterexample left.
    RefinementLimit {
        rounds: usize,
        counterexample: Option<Counterexample>,
    },
}

impl UnknownReason {
    /// Why a run that aborted for `reason` has no verdict.
    pub(crate) fn aborted(reason: AbortReason) -> Self {
        match reason {
            AbortReason::Cancelled => UnknownReason::Cancelled,
            AbortReason::ResourceExhausted => UnknownReason::ResourceExhausted,
            AbortReason::Failure => {
                UnknownReason::TransferFailure("exploration aborted by a failure".to_string())
            }
        }
    }
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::Cancelled => write!(f, "cancelled"),
            UnknownReason::ResourceExhausted => write!(f, "iteration limit reached"),
            UnknownReason::Incomplete { cutoffs } => {
                write!(f, "incomplete exploration ({} cutoffs)", cutoffs.len())
            }
            UnknownReason::TransferFailure(message) => write!(f, "transfer failure: {message}"),
            UnknownReason::RefinementFailed { message, .. } => {
                write!(f, "refinement failed: {message}")
            }
            UnknownReason::RefinementLimit { rounds, .. } => {
                write!(f, "no verdict after {rounds} refinements")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    Safe,
    Unsafe(Counterexample),
    Unknown(UnknownReason),
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    pub fn is_unsafe(&self) -> bool {
        matches!(self, Verdict::Unsafe(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Verdict::Unknown(_))
    }

    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            Verdict::Unsafe(cex) => Some(cex),
            Verdict::Unknown(
                UnknownReason::RefinementFailed { counterexample, .. }
                | UnknownReason::RefinementLimit { counterexample, .. },
            ) => counterexample.as_ref(),
            _ => None,
        }
    }

    /// SAFE, unless exploration was cut short.
    pub(crate) fn safe_unless_incomplete(reached: &ReachedSet) -> Self {
        if reached.is_incomplete() {
            Verdict::Unknown(UnknownReason::Incomplete {
                cutoffs: reached.cutoffs().to_vec(),
            })
        } else {
            Verdict::Safe
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Unsafe(cex) => write!(f, "UNSAFE: {cex}"),
            Verdict::Unknown(reason) => write!(f, "UNKNOWN: {reason}"),
        }
    }
}

/// Everything a driver reports after one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerificationReport {
    pub verdict: Verdict,
    pub statistics: ReachabilityStatistics,
    /// Live reached states at termination.
    pub reached_size: usize,
    /// ARG nodes at termination, covered ones included.
    pub arg_size: usize,
}
