//! Control-flow automata consumed by the argus reachability engine.
//!
//! The engine treats a [`Cfa`] as an opaque, read-only graph: it only asks for
//! the outgoing edges of a location, the location an edge leads to, and stable
//! location identity. Everything else here (the builder, edge labels, the
//! expression language) exists so that component analyses and tests have a
//! concrete program representation to work with.

mod builder;
mod edge;
mod error;
mod expr;
mod graph;
mod ids;
mod location;

pub use builder::CfaBuilder;
pub use edge::{EdgeKind, EdgeRef, return_variable};
pub use error::CfaError;
pub use expr::{CmpOp, Expr, Pred};
pub use graph::{Cfa, Edges};
pub use ids::{CfaEdge, Location};
pub use location::{FunctionInfo, LocationInfo, LocationKind};
