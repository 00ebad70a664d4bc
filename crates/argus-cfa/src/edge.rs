use std::fmt;

use crate::{CfaEdge, Expr, Location, Pred};

/// The operation a control-flow edge performs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// No effect on data; the string is a human-readable description.
    Blank(String),
    /// `var := expr`
    Assign { var: String, expr: Expr },
    /// `assume(pred == truth)`; the branch is infeasible if the condition cannot hold.
    Assume { pred: Pred, truth: bool },
    /// `var := nondet()`
    Havoc { var: String },
    /// Jump from a call site into the callee's entry location, binding `params := args`.
    Call {
        callee: String,
        args: Vec<Expr>,
        params: Vec<String>,
        /// The caller location control returns to.
        return_site: Location,
    },
    /// Jump from the callee's exit back to a return site, optionally assigning the
    /// callee's return variable into `result`.
    Return {
        callee: String,
        call_site: Location,
        result: Option<String>,
    },
}

impl EdgeKind {
    pub fn is_call(&self) -> bool {
        matches!(self, EdgeKind::Call { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self, EdgeKind::Return { .. })
    }
}

/// Name of the variable holding `function`'s return value.
pub fn return_variable(function: &str) -> String {
    format!("{function}::ret")
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Blank(desc) => write!(f, "{desc}"),
            EdgeKind::Assign { var, expr } => write!(f, "{var} := {expr}"),
            EdgeKind::Assume { pred, truth: true } => write!(f, "[{pred}]"),
            EdgeKind::Assume { pred, truth: false } => write!(f, "[!({pred})]"),
            EdgeKind::Havoc { var } => write!(f, "{var} := nondet()"),
            EdgeKind::Call { callee, args, .. } => {
                write!(f, "call {callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            EdgeKind::Return {
                callee,
                result: Some(var),
                ..
            } => write!(f, "{var} := return {callee}"),
            EdgeKind::Return { callee, .. } => write!(f, "return {callee}"),
        }
    }
}

/// A borrowed view of one edge with its endpoints resolved.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef<'a> {
    pub id: CfaEdge,
    pub source: Location,
    pub target: Location,
    pub kind: &'a EdgeKind,
}

impl fmt::Display for EdgeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.source, self.target, self.kind)
    }
}
