use petgraph::graph::{EdgeIndex, NodeIndex};

macro_rules! graph_identifier {
    ($(#[$attr:meta])* struct $name:ident($index:ident)) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position in the underlying graph.
            pub fn raw(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn index(self) -> $index {
                $index::new(self.0 as usize)
            }
        }

        impl From<$index> for $name {
            fn from(value: $index) -> Self {
                Self(value.index() as u32)
            }
        }

        impl From<$name> for $index {
            fn from(value: $name) -> Self {
                $index::new(value.0 as usize)
            }
        }
    };
}

graph_identifier! {
    /// A program location (CFA node). Stable for the lifetime of the [`crate::Cfa`],
    /// so it can key reached-set partitions.
    struct Location(NodeIndex)
}

graph_identifier! {
    /// A control-flow edge between two locations.
    struct CfaEdge(EdgeIndex)
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl std::fmt::Display for CfaEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}
