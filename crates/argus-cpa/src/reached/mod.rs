//! The reached set: every live ARG node with its precision, partitioned by
//! location and call stack, plus the waitlist of nodes still to expand.

mod waitlist;

use std::sync::Arc;

use argus_cfa::{Cfa, CfaEdge, Location};
use indexmap::IndexSet;
use log::debug;
use rustc_hash::{FxBuildHasher, FxHashMap};

pub use waitlist::{Waitlist, WaitlistOrder};

use crate::arg::{Arg, Coverage, SubtreeRemoval};
use crate::{
    AnalysisError, CallStack, ComponentPrecision, CompositeAnalysis, CompositePrecision,
    CompositeState, InvariantViolation, NodeId,
};

type PartitionKey = (Location, CallStack);
type NodeSet = IndexSet<NodeId, FxBuildHasher>;

/// All states reached so far.
///
/// A node is *live* if it is in a partition (explorable, and a merge or stop
/// candidate) or a target. Covered nodes stay in the ARG but are not live.
/// The waitlist holds exactly the live non-target nodes that still need
/// expansion. A node whose expansion was interrupted keeps a resume point so
/// that the successors it already produced are not produced again.
#[derive(Debug, Clone)]
pub struct ReachedSet {
    cfa: Arc<Cfa>,
    arg: Arg,
    precisions: FxHashMap<NodeId, CompositePrecision>,
    partitions: FxHashMap<PartitionKey, NodeSet>,
    targets: NodeSet,
    waitlist: Waitlist,
    resume: FxHashMap<NodeId, ResumePoint>,
    cutoffs: Vec<String>,
}

/// Where an interrupted expansion continues: the index of the next outgoing
/// CFA edge, and of the next successor along that edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumePoint {
    pub edge: usize,
    pub successor: usize,
}

impl ReachedSet {
    pub fn new(cfa: Arc<Cfa>, order: WaitlistOrder) -> Self {
        Self {
            cfa,
            arg: Arg::new(),
            precisions: FxHashMap::default(),
            partitions: FxHashMap::default(),
            targets: NodeSet::default(),
            waitlist: Waitlist::new(order),
            resume: FxHashMap::default(),
            cutoffs: Vec::new(),
        }
    }

    pub fn cfa(&self) -> &Cfa {
        &self.cfa
    }

    pub fn shared_cfa(&self) -> Arc<Cfa> {
        Arc::clone(&self.cfa)
    }

    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.partitions.values().map(IndexSet::len).sum::<usize>() + self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    pub fn has_waiting(&self) -> bool {
        !self.waitlist.is_empty()
    }

    pub fn is_waiting(&self, node: NodeId) -> bool {
        self.waitlist.contains(node)
    }

    /// Where the interrupted expansion of `node` continues, if it was
    /// interrupted.
    pub fn resume_point(&self, node: NodeId) -> Option<ResumePoint> {
        self.resume.get(&node).copied()
    }

    pub fn state(&self, node: NodeId) -> Option<&CompositeState> {
        self.arg.node(node).map(|n| n.state())
    }

    pub fn precision(&self, node: NodeId) -> Option<&CompositePrecision> {
        self.precisions.get(&node)
    }

    fn require_state(&self, node: NodeId) -> Result<&CompositeState, AnalysisError> {
        self.state(node).ok_or(AnalysisError::UnknownNode(node))
    }

    pub fn is_live(&self, node: NodeId) -> bool {
        self.targets.contains(&node)
            || self.state(node).is_some_and(|s| {
                self.partitions
                    .get(&key(s))
                    .is_some_and(|set| set.contains(&node))
            })
    }

    pub fn is_target(&self, node: NodeId) -> bool {
        self.targets.contains(&node)
    }

    /// Target nodes in the order they were found.
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.targets.iter().copied()
    }

    pub fn last_target(&self) -> Option<NodeId> {
        self.targets.last().copied()
    }

    /// Live nodes in creation order.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arg
            .nodes()
            .map(|(id, _)| id)
            .filter(|&id| self.is_live(id))
    }

    /// Merge and stop candidates for `state`: the non-target live nodes with
    /// the same location and call stack, in insertion order.
    pub fn candidates(&self, state: &CompositeState) -> impl Iterator<Item = NodeId> + '_ {
        self.partitions
            .get(&key(state))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of live nodes at `location`, over all call stacks.
    pub fn count_at(&self, location: Location) -> usize {
        let partitioned: usize = self
            .partitions
            .iter()
            .filter(|((loc, _), _)| *loc == location)
            .map(|(_, set)| set.len())
            .sum();
        let targets = self
            .targets
            .iter()
            .filter(|&&t| self.state(t).is_some_and(|s| s.location() == location))
            .count();
        partitioned + targets
    }

    /// Record that exploration was cut short; the set can no longer prove safety.
    pub fn record_cutoff(&mut self, reason: impl Into<String>) {
        self.cutoffs.push(reason.into());
    }

    pub fn is_incomplete(&self) -> bool {
        !self.cutoffs.is_empty()
    }

    pub fn cutoffs(&self) -> &[String] {
        &self.cutoffs
    }

    fn priority(&self, state: &CompositeState) -> u32 {
        let location = state.location();
        match self.waitlist.order() {
            WaitlistOrder::ReversePostorder => self.cfa.reverse_postorder(location),
            WaitlistOrder::DistanceToError => {
                self.cfa.distance_to_error(location).unwrap_or(u32::MAX)
            }
            WaitlistOrder::BreadthFirst | WaitlistOrder::DepthFirst => 0,
        }
    }

    fn enqueue(&mut self, node: NodeId) -> Result<(), AnalysisError> {
        let priority = self.priority(self.require_state(node)?);
        self.waitlist.push(node, priority);
        Ok(())
    }

    fn insert_live(
        &mut self,
        node: NodeId,
        precision: CompositePrecision,
    ) -> Result<(), AnalysisError> {
        let partition = key(self.require_state(node)?);
        self.precisions.insert(node, precision);
        self.partitions.entry(partition).or_default().insert(node);
        self.enqueue(node)
    }

    /// Add an initial state as a new ARG root. An initial target is recorded
    /// as a target right away and never expanded.
    pub fn add_initial(
        &mut self,
        state: CompositeState,
        precision: CompositePrecision,
    ) -> Result<NodeId, AnalysisError> {
        let is_target = state.is_target();
        let node = self.arg.add_root(state);
        if is_target {
            debug!("initial node {node} is a target");
            self.precisions.insert(node, precision);
            self.targets.insert(node);
        } else {
            self.insert_live(node, precision)?;
        }
        Ok(node)
    }

    /// Add a fresh, uncovered successor of `parent`.
    pub fn add_successor(
        &mut self,
        state: CompositeState,
        precision: CompositePrecision,
        parent: NodeId,
        edge: CfaEdge,
    ) -> Result<NodeId, AnalysisError> {
        let node = self.arg.add_node(state);
        self.arg.add_edge(parent, node, edge)?;
        self.insert_live(node, precision)?;
        Ok(node)
    }

    /// Add a successor of `parent` that is covered on arrival. It is kept in
    /// the ARG (with its precision, in case it is uncovered later) but is not
    /// live.
    pub fn add_covered(
        &mut self,
        state: CompositeState,
        precision: CompositePrecision,
        parent: NodeId,
        edge: CfaEdge,
        coverage: Coverage,
    ) -> Result<NodeId, AnalysisError> {
        let node = self.arg.add_node(state);
        self.arg.add_edge(parent, node, edge)?;
        self.arg.cover(node, coverage)?;
        self.precisions.insert(node, precision);
        Ok(node)
    }

    /// Record `parent --edge--> node` for a successor absorbed by a merge
    /// into the existing `node`.
    pub fn add_parent(
        &mut self,
        node: NodeId,
        parent: NodeId,
        edge: CfaEdge,
    ) -> Result<(), AnalysisError> {
        self.arg.add_edge(parent, node, edge)
    }

    /// Replace the state of a live node by a merge result from the same
    /// partition, and schedule it for re-expansion.
    pub fn replace_state(
        &mut self,
        node: NodeId,
        state: CompositeState,
    ) -> Result<(), AnalysisError> {
        let old = self.require_state(node)?;
        if !old.same_partition(&state) {
            return Err(InvariantViolation::Integrity(format!(
                "merge moved node {node} from {} to {}",
                old.location(),
                state.location()
            ))
            .into());
        }
        self.arg.replace_state(node, state)?;
        self.resume.remove(&node);
        if !self.targets.contains(&node) {
            self.enqueue(node)?;
        }
        Ok(())
    }

    /// Move a live node from its partition to the target set. Targets are
    /// never expanded and never cover other nodes.
    pub fn mark_target(&mut self, node: NodeId) -> Result<(), AnalysisError> {
        let partition = key(self.require_state(node)?);
        if let Some(set) = self.partitions.get_mut(&partition) {
            set.shift_remove(&node);
            if set.is_empty() {
                self.partitions.remove(&partition);
            }
        }
        self.waitlist.remove(node);
        self.resume.remove(&node);
        self.targets.insert(node);
        Ok(())
    }

    /// Take the next node to expand, with the resume point of its
    /// interrupted expansion if there is one.
    pub fn pop(&mut self) -> Option<(NodeId, ResumePoint)> {
        let node = self.waitlist.pop()?;
        let resume = self.resume.remove(&node).unwrap_or_default();
        Some((node, resume))
    }

    /// Put a live node back on the waitlist for a complete expansion.
    /// Targets and covered nodes are ignored.
    pub fn reinsert(&mut self, node: NodeId) -> Result<(), AnalysisError> {
        self.resume.remove(&node);
        if self.is_live(node) && !self.targets.contains(&node) {
            self.enqueue(node)?;
        }
        Ok(())
    }

    /// Put a live node back on the waitlist after its expansion stopped
    /// early; the next expansion starts at `resume`. A node that is already
    /// waiting, e.g. because a merge changed its state meanwhile, stays
    /// scheduled for a complete expansion.
    pub fn suspend(&mut self, node: NodeId, resume: ResumePoint) -> Result<(), AnalysisError> {
        if self.is_live(node) && !self.targets.contains(&node) && !self.waitlist.contains(node) {
            self.resume.insert(node, resume);
            self.enqueue(node)?;
        }
        Ok(())
    }

    pub fn set_precision(
        &mut self,
        node: NodeId,
        precision: CompositePrecision,
    ) -> Result<(), AnalysisError> {
        self.require_state(node)?;
        self.precisions.insert(node, precision);
        Ok(())
    }

    /// Remove `node` and every node derived from it (see
    /// [`Arg::remove_subtree`]) from the ARG and the reached set.
    ///
    /// Surviving nodes that were covered by a removed node become live again,
    /// and surviving parents of removed nodes are put back on the waitlist so
    /// the removed part can be re-explored.
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<SubtreeRemoval, AnalysisError> {
        let doomed = self.arg.removal_set(node)?;
        let removal = self.remove_nodes(doomed)?;
        debug!(
            "removed {} nodes below {node}; {} uncovered, {} reopened",
            removal.removed.len(),
            removal.uncovered.len(),
            removal.reopened.len()
        );
        Ok(removal)
    }

    fn remove_nodes(&mut self, doomed: Vec<NodeId>) -> Result<SubtreeRemoval, AnalysisError> {
        for &id in &doomed {
            let partition = key(self.require_state(id)?);
            if let Some(set) = self.partitions.get_mut(&partition) {
                set.shift_remove(&id);
                if set.is_empty() {
                    self.partitions.remove(&partition);
                }
            }
            self.targets.shift_remove(&id);
            self.waitlist.remove(id);
            self.resume.remove(&id);
            self.precisions.remove(&id);
        }
        let removal = self.arg.remove_nodes(doomed)?;
        for &id in &removal.uncovered {
            let precision = self.precisions.get(&id).cloned().ok_or_else(|| {
                InvariantViolation::Integrity(format!("covered node {id} has no precision"))
            })?;
            let state = self.require_state(id)?;
            if state.is_target() {
                self.precisions.insert(id, precision);
                self.targets.insert(id);
            } else {
                self.insert_live(id, precision)?;
            }
        }
        for &id in &removal.reopened {
            self.reinsert(id)?;
        }
        Ok(removal)
    }

    /// Restart exploration below `pivot` with component `component` of its
    /// precision replaced.
    ///
    /// If `pivot` has parents, it is removed with everything derived from
    /// it. A root pivot is kept and only what is derived from it is removed.
    /// The new precision is installed on every reopened node, and on a root
    /// pivot, before they are re-explored.
    pub fn refine(
        &mut self,
        pivot: NodeId,
        component: usize,
        precision: ComponentPrecision,
    ) -> Result<SubtreeRemoval, AnalysisError> {
        let is_root = self
            .arg
            .node(pivot)
            .ok_or(AnalysisError::UnknownNode(pivot))?
            .is_root();
        let doomed = if is_root {
            self.arg.descendants(pivot)?
        } else {
            self.arg.removal_set(pivot)?
        };
        let removal = self.remove_nodes(doomed)?;
        let mut restart = removal.reopened.clone();
        if is_root && !restart.contains(&pivot) {
            restart.push(pivot);
        }
        for node in restart {
            let current = self
                .precisions
                .get(&node)
                .ok_or(AnalysisError::UnknownNode(node))?;
            let refined = current.with_component(component, precision.clone())?;
            self.precisions.insert(node, refined);
            self.reinsert(node)?;
        }
        debug!(
            "refined at node {pivot}: removed {}, reopened {}",
            removal.removed.len(),
            removal.reopened.len()
        );
        Ok(removal)
    }

    /// Validate the reached-set invariants against the ARG: live nodes sit
    /// in the partition of their state, the waitlist only holds live
    /// non-targets, every node has a precision, and every covered node is
    /// below what covers it (a single node, or the join of several).
    pub fn check_integrity(&self, analysis: &CompositeAnalysis) -> Result<(), InvariantViolation> {
        let fail = |msg: String| Err(InvariantViolation::Integrity(msg));
        self.arg.check_integrity()?;
        for (partition, set) in &self.partitions {
            for &id in set {
                let Some(state) = self.state(id) else {
                    return fail(format!("partition holds deleted node {id}"));
                };
                if key(state) != *partition {
                    return fail(format!("node {id} is in the wrong partition"));
                }
                if state.is_target() {
                    return fail(format!("target node {id} is a merge candidate"));
                }
                if self.arg.node(id).is_some_and(|n| n.is_covered()) {
                    return fail(format!("covered node {id} is live"));
                }
            }
        }
        for (id, node) in self.arg.nodes() {
            if !self.precisions.contains_key(&id) {
                return fail(format!("node {id} has no precision"));
            }
            if self.waitlist.contains(id) && (!self.is_live(id) || self.targets.contains(&id)) {
                return fail(format!("waitlist holds node {id} that cannot be expanded"));
            }
            if let Some(coverage) = node.coverage() {
                let mut covering = Vec::with_capacity(coverage.nodes().len());
                for &m in coverage.nodes() {
                    let Some(state) = self.state(m) else {
                        return fail(format!("node {id} is covered by deleted node {m}"));
                    };
                    covering.push(state);
                }
                let subsumed = analysis
                    .join_states(&covering)
                    .is_some_and(|joined| analysis.is_less_or_equal(node.state(), &joined));
                if !subsumed {
                    return fail(format!("node {id} is not subsumed by {:?}", coverage.nodes()));
                }
            }
        }
        for &id in self.resume.keys() {
            if !self.waitlist.contains(id) {
                return fail(format!("node {id} has a resume point but is not waiting"));
            }
        }
        Ok(())
    }
}

fn key(state: &CompositeState) -> PartitionKey {
    (state.location(), state.call_stack().clone())
}
