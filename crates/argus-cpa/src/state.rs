use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::Lattice;

/// An abstract state of one component analysis.
///
/// States are immutable values: operators always return fresh states and the
/// engine shares them freely between ARG nodes.
pub trait AbstractState:
    Lattice + Clone + fmt::Debug + PartialEq + Eq + Hash + Send + Sync + 'static
{
    /// Whether this state describes a property violation.
    fn is_target(&self) -> bool {
        false
    }

    /// Human-readable description of the violated property, for target states.
    fn violation(&self) -> Option<String> {
        None
    }
}

/// Object-safe view of an [`AbstractState`], used to store heterogeneous
/// component states in one composite tuple.
trait ErasedState: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedState) -> bool;
    fn hash_erased(&self, state: &mut dyn Hasher);
    fn is_target(&self) -> bool;
    fn violation(&self) -> Option<String>;
}

impl<S: AbstractState> ErasedState for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedState) -> bool {
        other.as_any().downcast_ref::<S>() == Some(self)
    }

    fn hash_erased(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn is_target(&self) -> bool {
        AbstractState::is_target(self)
    }

    fn violation(&self) -> Option<String> {
        AbstractState::violation(self)
    }
}

/// A type-erased, reference-counted component state.
#[derive(Clone)]
pub struct ComponentState(Arc<dyn ErasedState>);

impl ComponentState {
    pub fn new<S: AbstractState>(state: S) -> Self {
        Self(Arc::new(state))
    }

    pub fn downcast_ref<S: AbstractState>(&self) -> Option<&S> {
        self.0.as_any().downcast_ref::<S>()
    }

    pub fn is_target(&self) -> bool {
        self.0.is_target()
    }

    pub fn violation(&self) -> Option<String> {
        self.0.violation()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ComponentState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.eq_erased(other.0.as_ref())
    }
}

impl Eq for ComponentState {}

impl Hash for ComponentState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_erased(state);
    }
}

impl fmt::Debug for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Typed lookup into a tuple of component states.
///
/// During transfer the tuple holds the successors computed so far for earlier
/// components and the predecessor states for the rest; during precision
/// adjustment it holds the complete successor.
#[derive(Clone, Copy)]
pub struct StateProjection<'a> {
    components: &'a [ComponentState],
}

impl<'a> StateProjection<'a> {
    pub fn new(components: &'a [ComponentState]) -> Self {
        Self { components }
    }

    /// The first component state of type `S`, if any.
    pub fn get<S: AbstractState>(&self) -> Option<&'a S> {
        self.components.iter().find_map(|c| c.downcast_ref::<S>())
    }

    pub fn component(&self, index: usize) -> Option<&'a ComponentState> {
        self.components.get(index)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for StateProjection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components).finish()
    }
}
