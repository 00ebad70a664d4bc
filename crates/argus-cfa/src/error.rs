use crate::Location;

/// Errors raised while assembling a [`crate::Cfa`].
#[derive(Debug, thiserror::Error)]
pub enum CfaError {
    /// A function was declared twice.
    #[error("function '{0}' is already declared")]
    DuplicateFunction(String),
    /// An edge or call referenced a function that was never declared.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// An edge endpoint does not exist in the graph under construction.
    #[error("unknown location {0}")]
    UnknownLocation(Location),
    /// Call argument count does not match the callee's parameter count.
    #[error("call to '{callee}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
    },
    /// An edge leaves a function exit, or enters a function entry, outside call/return wiring.
    #[error("edge {from} -> {to} crosses a function boundary")]
    CrossFunctionEdge { from: Location, to: Location },
}
