//! Configurable program analysis: the reachability engine behind argus.
//!
//! A [`CompositeAnalysis`] combines component analyses ([`Cpa`]) into one
//! product domain. [`CpaAlgorithm`] explores its state space over a
//! [`argus_cfa::Cfa`], recording every reached state in a [`ReachedSet`] and
//! the derivation of each state in the abstract reachability graph
//! ([`Arg`]). [`CegarAlgorithm`] wraps the exploration in a refinement loop
//! and [`Verifier`] packages the whole pipeline.

mod algorithm;
mod analysis;
mod arena;
mod arg;
mod callstack;
mod composite;
mod error;
mod lattice;
mod precision;
mod reached;
mod report;
mod shutdown;
mod state;
mod stats;
mod verifier;

pub use algorithm::{
    AbortReason, AlgorithmStatus, CegarAlgorithm, CpaAlgorithm, ReachabilityConfig, Refinement,
    Refiner,
};
pub use analysis::{
    Action, AdjustContext, Adjustment, Cpa, MergeStrategy, StopStrategy, Successors,
    TransferContext,
};
pub use arg::{Arg, ArgEdge, ArgNode, ArgPath, Coverage, NodeId, SubtreeRemoval};
pub use callstack::{CallFrame, CallStack};
pub use composite::{
    CompositeAnalysis, CompositeState, CompositeStop, PrecisionAdjustment, StopDecision,
};
pub use error::{AnalysisError, InvariantViolation, RefinementError, TransferError};
pub use lattice::{HasBottom, HasTop, Lattice};
pub use precision::{ComponentPrecision, CompositePrecision, Precision};
pub use reached::{ReachedSet, ResumePoint, Waitlist, WaitlistOrder};
pub use report::{Counterexample, UnknownReason, VerificationReport, Verdict};
pub use shutdown::ShutdownNotifier;
pub use state::{AbstractState, ComponentState, StateProjection};
pub use stats::{ReachabilityStatistics, StatisticsSink};
pub use verifier::Verifier;
