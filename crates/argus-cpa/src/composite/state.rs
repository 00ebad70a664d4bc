use std::fmt;
use std::sync::Arc;

use argus_cfa::Location;

use crate::{AbstractState, CallStack, ComponentState, StateProjection};

/// The product state the engine stores in the ARG: a program location, the
/// call stack, and one state per component analysis.
///
/// Location and call stack are part of the state rather than components so
/// that the reached set can partition by them directly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CompositeState {
    location: Location,
    call_stack: CallStack,
    components: Arc<[ComponentState]>,
}

impl CompositeState {
    pub fn new(location: Location, call_stack: CallStack, components: Vec<ComponentState>) -> Self {
        Self {
            location,
            call_stack,
            components: components.into(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn components(&self) -> &[ComponentState] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&ComponentState> {
        self.components.get(index)
    }

    /// The first component state of type `S`.
    pub fn get<S: AbstractState>(&self) -> Option<&S> {
        self.projection().get::<S>()
    }

    pub fn projection(&self) -> StateProjection<'_> {
        StateProjection::new(&self.components)
    }

    /// Same location and call stack, so the two states may be merged or
    /// compared.
    pub fn same_partition(&self, other: &Self) -> bool {
        self.location == other.location && self.call_stack == other.call_stack
    }

    /// A state is a target if any component says so.
    pub fn is_target(&self) -> bool {
        self.components.iter().any(ComponentState::is_target)
    }

    /// Violation descriptions of all target components.
    pub fn violations(&self) -> Vec<String> {
        self.components
            .iter()
            .filter_map(ComponentState::violation)
            .collect()
    }
}

impl fmt::Debug for CompositeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeState")
            .field("location", &self.location)
            .field("call_stack", &self.call_stack)
            .field("components", &&*self.components)
            .finish()
    }
}
