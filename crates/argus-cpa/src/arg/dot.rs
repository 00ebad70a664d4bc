use std::fmt::Write;

use argus_cfa::Cfa;

use crate::arg::Arg;

impl Arg {
    /// Render the ARG in Graphviz DOT syntax.
    ///
    /// Targets are filled red, covered nodes are dashed, and coverage is drawn
    /// as a dotted edge from the covered node to its covering node.
    pub fn to_dot(&self, cfa: &Cfa) -> String {
        let mut out = String::from("digraph ARG {\n  node [shape=box];\n");
        for (id, node) in self.nodes() {
            let state = node.state();
            let mut attrs = format!("label=\"{id} @ {}\"", state.location());
            if state.is_target() {
                attrs.push_str(", style=filled, fillcolor=red");
            } else if node.is_covered() {
                attrs.push_str(", style=dashed");
            }
            let _ = writeln!(out, "  {id} [{attrs}];");
        }
        for (id, node) in self.nodes() {
            for child in node.children() {
                let label = cfa
                    .edge(child.edge)
                    .map(|e| e.kind.to_string())
                    .unwrap_or_else(|| child.edge.to_string());
                let label = label.replace('"', "\\\"");
                let _ = writeln!(out, "  {id} -> {} [label=\"{label}\"];", child.node);
            }
            if let Some(coverage) = node.coverage() {
                for covering in coverage.nodes() {
                    let _ = writeln!(out, "  {id} -> {covering} [style=dotted];");
                }
            }
        }
        out.push_str("}\n");
        out
    }
}
