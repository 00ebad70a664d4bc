//! The abstract reachability graph: every reached state as a node, with the
//! CFA edge that produced it and the covering relation between nodes.

mod dot;
mod path;

use std::collections::VecDeque;
use std::fmt;

use argus_cfa::CfaEdge;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

pub use path::ArgPath;

use crate::arena::{Arena, identifier};
use crate::{AnalysisError, CompositeState, InvariantViolation};

identifier! {
    /// An ARG node. Identifiers increase monotonically and are never reused.
    struct NodeId
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// One end of a parent/child link, labelled with the CFA edge taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgEdge {
    pub node: NodeId,
    pub edge: CfaEdge,
}

/// Why a node is not expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// A single node subsumes this one.
    Node(NodeId),
    /// The join of several nodes subsumes this one.
    Join(SmallVec<[NodeId; 4]>),
}

impl Coverage {
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Coverage::Node(node) => std::slice::from_ref(node),
            Coverage::Join(nodes) => nodes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArgNode {
    state: CompositeState,
    root: bool,
    parents: SmallVec<[ArgEdge; 1]>,
    children: SmallVec<[ArgEdge; 2]>,
    coverage: Option<Coverage>,
    covers: SmallVec<[NodeId; 2]>,
}

impl ArgNode {
    pub fn state(&self) -> &CompositeState {
        &self.state
    }

    /// Incoming links; the first one is the link the node was created with.
    pub fn parents(&self) -> &[ArgEdge] {
        &self.parents
    }

    pub fn children(&self) -> &[ArgEdge] {
        &self.children
    }

    pub fn coverage(&self) -> Option<&Coverage> {
        self.coverage.as_ref()
    }

    /// The single node covering this one, if covered by exactly one node.
    pub fn covered_by(&self) -> Option<NodeId> {
        match self.coverage {
            Some(Coverage::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn is_covered(&self) -> bool {
        self.coverage.is_some()
    }

    /// Nodes this node covers.
    pub fn covers(&self) -> &[NodeId] {
        &self.covers
    }

    /// Whether this node holds an initial state. Roots may still gain parents
    /// when a loop merges back into them.
    pub fn is_root(&self) -> bool {
        self.root
    }
}

/// What [`Arg::remove_subtree`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreeRemoval {
    /// Deleted nodes, in creation order.
    pub removed: Vec<NodeId>,
    /// Surviving nodes that lost their covering node and must be explored again.
    pub uncovered: Vec<NodeId>,
    /// Surviving nodes that lost a child and must be expanded again.
    pub reopened: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Arg {
    nodes: Arena<NodeId, ArgNode>,
}

impl Arg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, covered ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub fn node(&self, node: NodeId) -> Option<&ArgNode> {
        self.nodes.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ArgNode)> {
        self.nodes.iter()
    }

    /// Nodes holding initial states.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(|(_, n)| n.is_root())
            .map(|(id, _)| id)
    }

    fn require(&self, node: NodeId) -> Result<&ArgNode, AnalysisError> {
        self.nodes.get(node).ok_or(AnalysisError::UnknownNode(node))
    }

    fn require_mut(&mut self, node: NodeId) -> Result<&mut ArgNode, AnalysisError> {
        self.nodes.get_mut(node).ok_or(AnalysisError::UnknownNode(node))
    }

    /// Add a node for an initial state.
    pub fn add_root(&mut self, state: CompositeState) -> NodeId {
        self.alloc(state, true)
    }

    /// Add a node that will be linked to a parent with [`Arg::add_edge`].
    pub fn add_node(&mut self, state: CompositeState) -> NodeId {
        self.alloc(state, false)
    }

    fn alloc(&mut self, state: CompositeState, root: bool) -> NodeId {
        self.nodes.alloc(ArgNode {
            state,
            root,
            parents: SmallVec::new(),
            children: SmallVec::new(),
            coverage: None,
            covers: SmallVec::new(),
        })
    }

    /// Link `parent -> child` via `edge`. Linking the same pair twice with the
    /// same edge is a no-op.
    pub fn add_edge(
        &mut self,
        parent: NodeId,
        child: NodeId,
        edge: CfaEdge,
    ) -> Result<(), AnalysisError> {
        self.require(child)?;
        let link = ArgEdge { node: child, edge };
        let parent_node = self.require_mut(parent)?;
        if parent_node.children.contains(&link) {
            return Ok(());
        }
        parent_node.children.push(link);
        self.require_mut(child)?.parents.push(ArgEdge { node: parent, edge });
        Ok(())
    }

    pub(crate) fn replace_state(
        &mut self,
        node: NodeId,
        state: CompositeState,
    ) -> Result<(), AnalysisError> {
        self.require_mut(node)?.state = state;
        Ok(())
    }

    /// Record that `node` is covered. Covering nodes must exist, must not be
    /// covered themselves, and must not be targets.
    pub fn cover(&mut self, node: NodeId, coverage: Coverage) -> Result<(), AnalysisError> {
        if self.require(node)?.is_covered() {
            return Err(InvariantViolation::AlreadyCovered(node).into());
        }
        for &covering in coverage.nodes() {
            if covering == node {
                return Err(InvariantViolation::SelfCover(node).into());
            }
            let covering_node = self.require(covering)?;
            if covering_node.is_covered() {
                return Err(InvariantViolation::CoveringChain { node, covering }.into());
            }
            if covering_node.state.is_target() {
                return Err(InvariantViolation::CoveredByTarget { node, covering }.into());
            }
        }
        for &covering in coverage.nodes() {
            self.require_mut(covering)?.covers.push(node);
        }
        self.require_mut(node)?.coverage = Some(coverage);
        Ok(())
    }

    /// Drop the coverage of `node`. Returns whether it was covered.
    pub fn uncover(&mut self, node: NodeId) -> bool {
        let Some(coverage) = self.nodes.get_mut(node).and_then(|n| n.coverage.take()) else {
            return false;
        };
        for &covering in coverage.nodes() {
            if let Some(m) = self.nodes.get_mut(covering) {
                m.covers.retain(|c| *c != node);
            }
        }
        true
    }

    /// Delete `pivot` and every node derived from it.
    ///
    /// A node's state depends on all of its parents, since extra parents
    /// come from merges. A node with a deleted parent is therefore deleted
    /// too, even if another parent survives. Roots other than `pivot` hold
    /// initial states and are never deleted.
    ///
    /// Links from survivors are cut, and survivors covered by a deleted node
    /// are uncovered. The caller decides how survivors re-enter exploration.
    pub fn remove_subtree(&mut self, pivot: NodeId) -> Result<SubtreeRemoval, AnalysisError> {
        let removed = self.removal_set(pivot)?;
        self.remove_nodes(removed)
    }

    /// The nodes [`Arg::remove_subtree`] would delete, in creation order.
    pub(crate) fn removal_set(&self, pivot: NodeId) -> Result<Vec<NodeId>, AnalysisError> {
        let mut removed = self.descendants(pivot)?;
        if !removed.contains(&pivot) {
            removed.push(pivot);
            removed.sort_unstable();
        }
        Ok(removed)
    }

    /// Non-root nodes reachable from `node` along child links, in creation
    /// order. `node` itself is included only if a loop leads back to it.
    pub(crate) fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>, AnalysisError> {
        let start = self.require(node)?;
        let mut seen = FxHashSet::default();
        let mut stack: Vec<NodeId> = start.children.iter().map(|c| c.node).collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(n) = self.nodes.get(id) {
                stack.extend(n.children.iter().map(|c| c.node));
            }
        }
        let mut descendants: Vec<NodeId> = seen
            .into_iter()
            .filter(|&id| self.nodes.get(id).is_some_and(|n| !n.is_root()))
            .collect();
        descendants.sort_unstable();
        Ok(descendants)
    }

    pub(crate) fn remove_nodes(
        &mut self,
        removed: Vec<NodeId>,
    ) -> Result<SubtreeRemoval, AnalysisError> {
        let doomed: FxHashSet<NodeId> = removed.iter().copied().collect();
        let mut result = SubtreeRemoval::default();
        for &id in &removed {
            let node = self.require(id)?;
            let parents = node.parents.clone();
            let children = node.children.clone();
            let covers = node.covers.clone();
            let coverage = node.coverage.clone();

            for p in parents.iter().filter(|p| !doomed.contains(&p.node)) {
                self.require_mut(p.node)?.children.retain(|c| c.node != id);
                if !result.reopened.contains(&p.node) {
                    result.reopened.push(p.node);
                }
            }
            for c in children.iter().filter(|c| !doomed.contains(&c.node)) {
                self.require_mut(c.node)?.parents.retain(|p| p.node != id);
            }
            for &covered in covers.iter().filter(|c| !doomed.contains(c)) {
                if self.uncover(covered) && !result.uncovered.contains(&covered) {
                    result.uncovered.push(covered);
                }
            }
            for covering in coverage.iter().flat_map(|c| c.nodes().iter()) {
                if !doomed.contains(covering) {
                    self.require_mut(*covering)?.covers.retain(|c| *c != id);
                }
            }
        }
        for &id in &removed {
            self.nodes.delete(id);
        }
        result.removed = removed;
        Ok(result)
    }

    /// A path from an ARG root to `target`, following parent links.
    ///
    /// Parents are tried in link order, so in tree-shaped regions this is the
    /// path the node was created along; where merges introduced several
    /// parents the shortest way back to a root is taken.
    pub fn path_to(&self, target: NodeId) -> Result<ArgPath, AnalysisError> {
        self.require(target)?;
        let mut via: FxHashMap<NodeId, ArgEdge> = FxHashMap::default();
        let mut queue = VecDeque::from([target]);
        let mut seen = FxHashSet::from_iter([target]);
        let mut root = None;
        while let Some(id) = queue.pop_front() {
            let node = self.require(id)?;
            if node.is_root() {
                root = Some(id);
                break;
            }
            for parent in &node.parents {
                if seen.insert(parent.node) {
                    via.insert(parent.node, ArgEdge { node: id, edge: parent.edge });
                    queue.push_back(parent.node);
                }
            }
        }
        let Some(root) = root else {
            return Err(InvariantViolation::Integrity(format!(
                "node {target} is not reachable from any root"
            ))
            .into());
        };

        let mut nodes = vec![root];
        let mut edges = Vec::new();
        let mut current = root;
        while current != target {
            let Some(step) = via.get(&current) else {
                break;
            };
            edges.push(step.edge);
            nodes.push(step.node);
            current = step.node;
        }
        Ok(ArgPath::new(nodes, edges))
    }

    /// Structural consistency: links are mirrored on both ends, covering
    /// nodes are live, uncovered and non-target, and coverage is mirrored in
    /// `covers`.
    pub fn check_integrity(&self) -> Result<(), InvariantViolation> {
        let fail = |msg: String| Err(InvariantViolation::Integrity(msg));
        for (id, node) in self.nodes() {
            if !node.root && node.parents.is_empty() {
                return fail(format!("non-root node {id} has no parent"));
            }
            for c in &node.children {
                let Some(child) = self.node(c.node) else {
                    return fail(format!("node {id} has deleted child {}", c.node));
                };
                if !child.parents.contains(&ArgEdge { node: id, edge: c.edge }) {
                    return fail(format!("child {} does not list parent {id}", c.node));
                }
            }
            for p in &node.parents {
                let Some(parent) = self.node(p.node) else {
                    return fail(format!("node {id} has deleted parent {}", p.node));
                };
                if !parent.children.contains(&ArgEdge { node: id, edge: p.edge }) {
                    return fail(format!("parent {} does not list child {id}", p.node));
                }
            }
            if let Some(coverage) = &node.coverage {
                for &m in coverage.nodes() {
                    let Some(covering) = self.node(m) else {
                        return fail(format!("node {id} is covered by deleted node {m}"));
                    };
                    if covering.is_covered() {
                        return fail(format!("covering node {m} is itself covered"));
                    }
                    if covering.state.is_target() {
                        return fail(format!("target node {m} covers node {id}"));
                    }
                    if !covering.covers.contains(&id) {
                        return fail(format!("node {m} does not record covering {id}"));
                    }
                }
            }
            for &c in &node.covers {
                if self.node(c).and_then(|n| n.coverage.as_ref()).is_none() {
                    return fail(format!("node {id} claims to cover uncovered node {c}"));
                }
            }
        }
        Ok(())
    }
}
