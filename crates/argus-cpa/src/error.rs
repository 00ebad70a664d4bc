use argus_cfa::{CfaEdge, Location};

use crate::NodeId;

/// Failure of a single component's transfer or precision adjustment.
///
/// Analysis-specific failures go in [`Custom`](Self::Custom) via
/// [`TransferError::custom`].
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The component cannot interpret this kind of edge.
    #[error("unsupported edge: {0}")]
    Unsupported(String),
    /// A call edge would push the call stack past the configured bound.
    #[error("call depth {depth} exceeds maximum {max}")]
    CallDepthExceeded { depth: usize, max: usize },
    /// A component looked up a sibling state or precision of the wrong type.
    #[error("component {index} has unexpected type, expected {expected}")]
    ComponentMismatch { index: usize, expected: &'static str },
    /// User-defined error.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl TransferError {
    /// Wrap an arbitrary error as [`TransferError::Custom`].
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransferError::Custom(Box::new(error))
    }
}

/// A broken structural guarantee of the reached set or ARG.
///
/// These indicate a bug in a component analysis or in the engine and are
/// never silently repaired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("node {0} cannot cover itself")]
    SelfCover(NodeId),
    #[error("node {0} is already covered")]
    AlreadyCovered(NodeId),
    #[error("node {covering} is covered itself and cannot cover {node}")]
    CoveringChain { node: NodeId, covering: NodeId },
    #[error("target node {covering} cannot cover {node}")]
    CoveredByTarget { node: NodeId, covering: NodeId },
    #[error("merged state at node {node} does not over-approximate the state it replaced")]
    MergeNotMonotone { node: NodeId },
    #[error("precision index {index} out of range for {len} components")]
    PrecisionArity { index: usize, len: usize },
    #[error("ARG integrity: {0}")]
    Integrity(String),
}

/// Error type for the reachability engine.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A component failed on one edge; the run is aborted.
    #[error("transfer failed on edge {edge} at {location}: {source}")]
    Transfer {
        edge: CfaEdge,
        location: Location,
        #[source]
        source: TransferError,
    },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("unknown ARG node {0}")]
    UnknownNode(NodeId),
    #[error("composite analysis has no components")]
    EmptyComposite,
}

/// Failure reported by a [`crate::Refiner`].
#[derive(Debug, thiserror::Error)]
pub enum RefinementError {
    /// The refiner could neither confirm nor refute the counterexample.
    #[error("refinement inconclusive: {0}")]
    Inconclusive(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl RefinementError {
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RefinementError::Custom(Box::new(error))
    }
}
