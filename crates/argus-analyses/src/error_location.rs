use std::collections::BTreeSet;

use argus_cfa::{Cfa, EdgeRef, Location};
use argus_cpa::{
    AbstractState, Cpa, HasBottom, Lattice, Successors, TransferContext, TransferError,
};
use log::debug;
use smallvec::smallvec;

/// Whether the current location violates the property, and which labels it
/// violates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorState {
    #[default]
    Safe,
    /// Never empty.
    Violation(BTreeSet<String>),
}

impl ErrorState {
    pub fn violated(label: impl Into<String>) -> Self {
        ErrorState::Violation(BTreeSet::from([label.into()]))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        let labels = match self {
            ErrorState::Safe => None,
            ErrorState::Violation(labels) => Some(labels),
        };
        labels.into_iter().flatten().map(String::as_str)
    }
}

impl Lattice for ErrorState {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (ErrorState::Safe, x) | (x, ErrorState::Safe) => x.clone(),
            (ErrorState::Violation(a), ErrorState::Violation(b)) => {
                ErrorState::Violation(a.union(b).cloned().collect())
            }
        }
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorState::Safe, _) => true,
            (ErrorState::Violation(_), ErrorState::Safe) => false,
            (ErrorState::Violation(a), ErrorState::Violation(b)) => a.is_subset(b),
        }
    }
}

impl HasBottom for ErrorState {
    fn bottom() -> Self {
        ErrorState::Safe
    }
}

impl AbstractState for ErrorState {
    fn is_target(&self) -> bool {
        matches!(self, ErrorState::Violation(_))
    }

    fn violation(&self) -> Option<String> {
        match self {
            ErrorState::Safe => None,
            ErrorState::Violation(labels) => {
                Some(labels.iter().cloned().collect::<Vec<_>>().join(", "))
            }
        }
    }
}

/// Target oracle: reaching an error location of the CFA violates the property.
#[derive(Debug, Clone, Default)]
pub struct ErrorLocationAnalysis {
    /// `None` checks every error location.
    labels: Option<BTreeSet<String>>,
}

impl ErrorLocationAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only error locations carrying one of `labels` are violations.
    pub fn only<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            labels: Some(labels.into_iter().map(Into::into).collect()),
        }
    }

    fn state_at(&self, cfa: &Cfa, location: Location) -> ErrorState {
        let Some(label) = cfa.location_info(location).and_then(|info| info.error_label()) else {
            return ErrorState::Safe;
        };
        if self.labels.as_ref().is_some_and(|labels| !labels.contains(label)) {
            return ErrorState::Safe;
        }
        ErrorState::violated(label)
    }
}

impl Cpa for ErrorLocationAnalysis {
    type State = ErrorState;
    type Precision = ();

    fn name(&self) -> &str {
        "error-location"
    }

    fn initial_state(&self, cfa: &Cfa, entry: Location) -> ErrorState {
        self.state_at(cfa, entry)
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        _state: &ErrorState,
        _precision: &(),
        edge: EdgeRef<'_>,
        ctx: &TransferContext<'_>,
    ) -> Result<Successors<ErrorState>, TransferError> {
        let next = self.state_at(ctx.cfa, edge.target);
        if next.is_target() {
            debug!("error location {} reached via {}", edge.target, edge.kind);
        }
        Ok(smallvec![next])
    }
}
