use argus_cfa::{Cfa, CfaEdge};

use crate::NodeId;
use crate::arg::Arg;

/// A root-to-node path through the ARG: `nodes[i] --edges[i]--> nodes[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArgPath {
    nodes: Vec<NodeId>,
    edges: Vec<CfaEdge>,
}

impl ArgPath {
    pub(crate) fn new(nodes: Vec<NodeId>, edges: Vec<CfaEdge>) -> Self {
        debug_assert_eq!(nodes.len(), edges.len() + 1);
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CfaEdge] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn first(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn last(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// `(from, edge, to)` triples along the path.
    pub fn steps(&self) -> impl Iterator<Item = (NodeId, CfaEdge, NodeId)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, &edge)| (self.nodes[i], edge, self.nodes[i + 1]))
    }

    /// One line per step: `source location -[edge label]-> target location`.
    pub fn render(&self, arg: &Arg, cfa: &Cfa) -> Vec<String> {
        self.steps()
            .map(|(from, edge, to)| {
                let location = |n: NodeId| {
                    arg.node(n)
                        .map(|node| node.state().location().to_string())
                        .unwrap_or_else(|| format!("<deleted {n}>"))
                };
                let label = cfa
                    .edge(edge)
                    .map(|e| e.kind.to_string())
                    .unwrap_or_else(|| edge.to_string());
                format!("{} -[{label}]-> {}", location(from), location(to))
            })
            .collect()
    }
}
