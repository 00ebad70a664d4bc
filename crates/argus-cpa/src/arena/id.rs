use std::hash::Hash;

/// Position of a slot in an [`crate::arena::Arena`]. Only the arena hands
/// these out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub(crate) usize);

impl Id {
    pub fn raw(self) -> usize {
        self.0
    }
}

pub trait Identifier:
    Sized + Clone + Copy + Hash + std::fmt::Debug + PartialEq + Eq + From<Id> + Into<Id>
{
}

/// Declare a newtype over [`Id`] that can index an [`crate::arena::Arena`].
macro_rules! identifier {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) $crate::arena::Id);

        impl $name {
            /// Allocation index; later nodes have larger indices.
            pub fn raw(self) -> usize {
                self.0.raw()
            }
        }

        impl From<$crate::arena::Id> for $name {
            fn from(value: $crate::arena::Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $crate::arena::Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl $crate::arena::Identifier for $name {}
    };
}

pub(crate) use identifier;
