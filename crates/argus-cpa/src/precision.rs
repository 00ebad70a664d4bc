use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::InvariantViolation;

/// Analysis-specific configuration that controls how coarse a component's
/// abstraction is (tracked variables, predicates, bounds).
pub trait Precision: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static> Precision for T {}

trait ErasedPrecision: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedPrecision) -> bool;
}

impl<P: Precision> ErasedPrecision for P {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedPrecision) -> bool {
        other.as_any().downcast_ref::<P>() == Some(self)
    }
}

/// A type-erased, reference-counted component precision.
#[derive(Clone)]
pub struct ComponentPrecision(Arc<dyn ErasedPrecision>);

impl ComponentPrecision {
    pub fn new<P: Precision>(precision: P) -> Self {
        Self(Arc::new(precision))
    }

    pub fn downcast_ref<P: Precision>(&self) -> Option<&P> {
        self.0.as_any().downcast_ref::<P>()
    }
}

impl PartialEq for ComponentPrecision {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_erased(other.0.as_ref())
    }
}

impl fmt::Debug for ComponentPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// The per-component precisions attached to one reached state.
///
/// Many nodes share the same precision, so the tuple is reference counted and
/// only copied when a single component is replaced.
#[derive(Clone, PartialEq)]
pub struct CompositePrecision {
    components: Arc<[ComponentPrecision]>,
}

impl CompositePrecision {
    pub fn new(components: Vec<ComponentPrecision>) -> Self {
        Self {
            components: components.into(),
        }
    }

    pub fn components(&self) -> &[ComponentPrecision] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&ComponentPrecision> {
        self.components.get(index)
    }

    /// The first component precision of type `P`.
    pub fn get<P: Precision>(&self) -> Option<&P> {
        self.components.iter().find_map(|p| p.downcast_ref::<P>())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Copy of this precision with component `index` replaced.
    pub fn with_component(
        &self,
        index: usize,
        precision: ComponentPrecision,
    ) -> Result<Self, InvariantViolation> {
        if index >= self.components.len() {
            return Err(InvariantViolation::PrecisionArity {
                index,
                len: self.components.len(),
            });
        }
        let mut components = self.components.to_vec();
        components[index] = precision;
        Ok(Self::new(components))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.components, &other.components)
    }
}

impl fmt::Debug for CompositePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components.iter()).finish()
    }
}
