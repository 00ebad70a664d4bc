use crate::Location;

/// What role a location plays inside its function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocationKind {
    Normal,
    FunctionEntry,
    FunctionExit,
    /// A property-violating location, carrying the label reported when it is reached.
    Error(String),
}

#[derive(Clone, Debug)]
pub struct LocationInfo {
    pub(crate) function: String,
    pub(crate) kind: LocationKind,
    /// Rank in reverse postorder over the whole CFA, filled in by the builder.
    pub(crate) rpo: u32,
    /// Shortest number of edges to any error location, if one is reachable.
    pub(crate) distance_to_error: Option<u32>,
}

impl LocationInfo {
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn kind(&self) -> &LocationKind {
        &self.kind
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, LocationKind::Error(_))
    }

    pub fn error_label(&self) -> Option<&str> {
        match &self.kind {
            LocationKind::Error(label) => Some(label),
            _ => None,
        }
    }

    pub fn reverse_postorder(&self) -> u32 {
        self.rpo
    }

    pub fn distance_to_error(&self) -> Option<u32> {
        self.distance_to_error
    }
}

/// Entry/exit bookkeeping for one function of the program.
#[derive(Clone, Debug)]
pub struct FunctionInfo {
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) entry: Location,
    pub(crate) exit: Location,
}

impl FunctionInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn entry(&self) -> Location {
        self.entry
    }

    pub fn exit(&self) -> Location {
        self.exit
    }
}
