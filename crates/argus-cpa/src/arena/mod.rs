//! Tombstoned storage for ARG nodes.

mod data;
mod id;
mod item;

pub use data::Arena;
pub use id::{Id, Identifier};
pub(crate) use id::identifier;
