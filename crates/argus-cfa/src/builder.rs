use petgraph::graph::DiGraph;
use rustc_hash::FxHashMap;

use crate::edge::return_variable;
use crate::{
    Cfa, CfaEdge, CfaError, EdgeKind, Expr, FunctionInfo, Location, LocationInfo, LocationKind,
    Pred,
};

/// Incrementally assembles a [`Cfa`].
///
/// Functions are declared first (which allocates their entry and exit
/// locations), then body locations and edges are added. [`CfaBuilder::build`]
/// validates the wiring and computes the location ranks used by waitlist
/// orderings.
///
/// ```
/// use argus_cfa::{CfaBuilder, Expr};
///
/// let mut b = CfaBuilder::new();
/// let main = b.function("main", &[]).unwrap();
/// let l1 = b.location("main").unwrap();
/// b.assign(main.entry(), l1, "x", Expr::constant(0)).unwrap();
/// b.blank(l1, main.exit(), "skip").unwrap();
/// let cfa = b.build("main").unwrap();
/// assert_eq!(cfa.num_locations(), 3);
/// ```
#[derive(Debug, Default)]
pub struct CfaBuilder {
    graph: DiGraph<LocationInfo, EdgeKind>,
    functions: FxHashMap<String, FunctionInfo>,
}

impl CfaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function, allocating its entry and exit locations.
    pub fn function(&mut self, name: &str, params: &[&str]) -> Result<FunctionInfo, CfaError> {
        if self.functions.contains_key(name) {
            return Err(CfaError::DuplicateFunction(name.to_string()));
        }
        let entry = self.add_location(name, LocationKind::FunctionEntry);
        let exit = self.add_location(name, LocationKind::FunctionExit);
        let info = FunctionInfo {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            entry,
            exit,
        };
        self.functions.insert(name.to_string(), info.clone());
        Ok(info)
    }

    /// Add an ordinary location to `function`.
    pub fn location(&mut self, function: &str) -> Result<Location, CfaError> {
        self.require_function(function)?;
        Ok(self.add_location(function, LocationKind::Normal))
    }

    /// Add a property-violating location to `function`.
    pub fn error_location(&mut self, function: &str, label: &str) -> Result<Location, CfaError> {
        self.require_function(function)?;
        Ok(self.add_location(function, LocationKind::Error(label.to_string())))
    }

    pub fn blank(&mut self, from: Location, to: Location, desc: &str) -> Result<CfaEdge, CfaError> {
        self.add_local_edge(from, to, EdgeKind::Blank(desc.to_string()))
    }

    pub fn assign(
        &mut self,
        from: Location,
        to: Location,
        var: &str,
        expr: Expr,
    ) -> Result<CfaEdge, CfaError> {
        self.add_local_edge(
            from,
            to,
            EdgeKind::Assign {
                var: var.to_string(),
                expr,
            },
        )
    }

    pub fn assume(
        &mut self,
        from: Location,
        to: Location,
        pred: Pred,
        truth: bool,
    ) -> Result<CfaEdge, CfaError> {
        self.add_local_edge(from, to, EdgeKind::Assume { pred, truth })
    }

    /// Add the two assume edges of a conditional: `pred` to `then_loc`, `!pred` to `else_loc`.
    pub fn branch(
        &mut self,
        from: Location,
        then_loc: Location,
        else_loc: Location,
        pred: Pred,
    ) -> Result<(CfaEdge, CfaEdge), CfaError> {
        let then_edge = self.assume(from, then_loc, pred.clone(), true)?;
        let else_edge = self.assume(from, else_loc, pred, false)?;
        Ok((then_edge, else_edge))
    }

    pub fn havoc(&mut self, from: Location, to: Location, var: &str) -> Result<CfaEdge, CfaError> {
        self.add_local_edge(
            from,
            to,
            EdgeKind::Havoc {
                var: var.to_string(),
            },
        )
    }

    /// Assign `expr` to `function`'s return variable on an edge into its exit location.
    pub fn ret(&mut self, from: Location, function: &str, expr: Expr) -> Result<CfaEdge, CfaError> {
        let exit = self.require_function(function)?.exit;
        let var = return_variable(function);
        self.assign(from, exit, &var, expr)
    }

    /// Wire a call: `call_site -> callee.entry` and `callee.exit -> return_site`.
    pub fn call(
        &mut self,
        call_site: Location,
        return_site: Location,
        callee: &str,
        args: Vec<Expr>,
        result: Option<&str>,
    ) -> Result<(CfaEdge, CfaEdge), CfaError> {
        let info = self.require_function(callee)?.clone();
        if info.params.len() != args.len() {
            return Err(CfaError::ArityMismatch {
                callee: callee.to_string(),
                expected: info.params.len(),
                got: args.len(),
            });
        }
        self.require_location(call_site)?;
        self.require_location(return_site)?;
        let caller = self.graph[call_site.index()].function.clone();
        if self.graph[return_site.index()].function != caller {
            return Err(CfaError::CrossFunctionEdge {
                from: call_site,
                to: return_site,
            });
        }
        let call = self.graph.add_edge(
            call_site.into(),
            info.entry.into(),
            EdgeKind::Call {
                callee: callee.to_string(),
                args,
                params: info.params.clone(),
                return_site,
            },
        );
        let ret = self.graph.add_edge(
            info.exit.into(),
            return_site.into(),
            EdgeKind::Return {
                callee: callee.to_string(),
                call_site,
                result: result.map(str::to_string),
            },
        );
        Ok((call.into(), ret.into()))
    }

    /// Finish the CFA with `main` as the program entry function.
    pub fn build(self, main: &str) -> Result<Cfa, CfaError> {
        if !self.functions.contains_key(main) {
            return Err(CfaError::UnknownFunction(main.to_string()));
        }
        let mut cfa = Cfa {
            graph: self.graph,
            functions: self.functions,
            main: main.to_string(),
        };
        cfa.compute_reverse_postorder();
        cfa.compute_distance_to_error();
        Ok(cfa)
    }

    fn add_location(&mut self, function: &str, kind: LocationKind) -> Location {
        self.graph
            .add_node(LocationInfo {
                function: function.to_string(),
                kind,
                rpo: 0,
                distance_to_error: None,
            })
            .into()
    }

    fn add_local_edge(
        &mut self,
        from: Location,
        to: Location,
        kind: EdgeKind,
    ) -> Result<CfaEdge, CfaError> {
        self.require_location(from)?;
        self.require_location(to)?;
        if self.graph[from.index()].function != self.graph[to.index()].function {
            return Err(CfaError::CrossFunctionEdge { from, to });
        }
        Ok(self.graph.add_edge(from.into(), to.into(), kind).into())
    }

    fn require_function(&self, name: &str) -> Result<&FunctionInfo, CfaError> {
        self.functions
            .get(name)
            .ok_or_else(|| CfaError::UnknownFunction(name.to_string()))
    }

    fn require_location(&self, loc: Location) -> Result<(), CfaError> {
        match self.graph.node_weight(loc.into()) {
            Some(_) => Ok(()),
            None => Err(CfaError::UnknownLocation(loc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_function_is_rejected() {
        let mut b = CfaBuilder::new();
        b.function("main", &[]).unwrap();
        assert!(matches!(
            b.function("main", &[]),
            Err(CfaError::DuplicateFunction(name)) if name == "main"
        ));
    }

    #[test]
    fn call_checks_arity() {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        b.function("f", &["a", "b"]).unwrap();
        let after = b.location("main").unwrap();
        let err = b
            .call(main.entry(), after, "f", vec![Expr::constant(1)], None)
            .unwrap_err();
        assert!(matches!(
            err,
            CfaError::ArityMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn intraprocedural_edges_stay_in_their_function() {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        let f = b.function("f", &[]).unwrap();
        assert!(matches!(
            b.blank(main.entry(), f.entry(), "jump"),
            Err(CfaError::CrossFunctionEdge { .. })
        ));
    }

    #[test]
    fn build_requires_known_main() {
        let mut b = CfaBuilder::new();
        b.function("f", &[]).unwrap();
        assert!(matches!(b.build("main"), Err(CfaError::UnknownFunction(_))));
    }
}
