//! The CPA reachability algorithm and the CEGAR loop around it.

mod cegar;
mod config;

use std::sync::Arc;

use argus_cfa::{Cfa, EdgeRef};
use log::{debug, info, trace, warn};

pub use cegar::{CegarAlgorithm, Refinement, Refiner};
pub use config::ReachabilityConfig;

use crate::arg::Coverage;
use crate::composite::{PrecisionAdjustment, StopDecision};
use crate::{
    Action, AnalysisError, CompositeAnalysis, CompositePrecision, CompositeState,
    InvariantViolation, NodeId, ReachabilityStatistics, ReachedSet, ResumePoint,
    ShutdownNotifier,
};

/// Why a run ended without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbortReason {
    Cancelled,
    ResourceExhausted,
    /// A transfer or invariant failure; the error is returned by `run`.
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmStatus {
    Running,
    /// The waitlist is empty and no target was reached.
    StoppedSafe,
    /// An uncovered target was reached.
    StoppedUnsafe,
    Aborted(AbortReason),
}

/// Worklist exploration of the composite analysis' state space.
///
/// The algorithm keeps no exploration state of its own: everything lives in
/// the [`ReachedSet`] passed to [`CpaAlgorithm::run`], so a run can be
/// resumed after the reached set was edited (e.g. by refinement).
pub struct CpaAlgorithm<'a> {
    analysis: &'a CompositeAnalysis,
    config: ReachabilityConfig,
    shutdown: ShutdownNotifier,
    statistics: ReachabilityStatistics,
    status: AlgorithmStatus,
}

impl<'a> CpaAlgorithm<'a> {
    pub fn new(analysis: &'a CompositeAnalysis) -> Self {
        Self {
            analysis,
            config: ReachabilityConfig::default(),
            shutdown: ShutdownNotifier::default(),
            statistics: ReachabilityStatistics::default(),
            status: AlgorithmStatus::Running,
        }
    }

    pub fn with_config(mut self, config: ReachabilityConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownNotifier) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn analysis(&self) -> &'a CompositeAnalysis {
        self.analysis
    }

    pub fn config(&self) -> &ReachabilityConfig {
        &self.config
    }

    pub fn status(&self) -> AlgorithmStatus {
        self.status
    }

    /// Counters accumulated over every run of this algorithm.
    pub fn statistics(&self) -> &ReachabilityStatistics {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut ReachabilityStatistics {
        &mut self.statistics
    }

    /// Seed a reached set with the initial state at `cfa`'s entry.
    pub fn initial_reached_set(&self, cfa: Arc<Cfa>) -> Result<ReachedSet, AnalysisError> {
        let entry = cfa.entry();
        self.seeded_reached_set(cfa, &[entry])
    }

    /// Seed a reached set with one initial state per entry location.
    pub fn seeded_reached_set(
        &self,
        cfa: Arc<Cfa>,
        entries: &[argus_cfa::Location],
    ) -> Result<ReachedSet, AnalysisError> {
        let mut reached = ReachedSet::new(cfa.clone(), self.config.waitlist_order);
        for &entry in entries {
            let state = self.analysis.initial_state(&cfa, entry)?;
            let precision = self.analysis.initial_precision(&cfa, entry);
            reached.add_initial(state, precision)?;
        }
        Ok(reached)
    }

    /// Explore until the waitlist is empty, a target is found (if so
    /// configured), the iteration budget is spent, or shutdown is requested.
    pub fn run(&mut self, reached: &mut ReachedSet) -> Result<AlgorithmStatus, AnalysisError> {
        self.status = AlgorithmStatus::Running;
        loop {
            if self.shutdown.is_shutdown_requested() {
                warn!("shutdown requested, aborting with {} states reached", reached.len());
                return Ok(self.finish(AlgorithmStatus::Aborted(AbortReason::Cancelled)));
            }
            if let Some(max) = self.config.max_iterations {
                if self.statistics.iterations >= max {
                    warn!("iteration limit {max} reached");
                    return Ok(self.finish(AlgorithmStatus::Aborted(AbortReason::ResourceExhausted)));
                }
            }
            self.statistics.max_waitlist = self.statistics.max_waitlist.max(reached.waitlist_len());
            let Some((node, resume)) = reached.pop() else {
                break;
            };
            self.statistics.iterations += 1;

            match self.expand(reached, node, resume) {
                Ok(None) => {}
                Ok(Some(status)) => return Ok(self.finish(status)),
                Err(err) => {
                    self.status = AlgorithmStatus::Aborted(AbortReason::Failure);
                    return Err(err);
                }
            }
        }

        let status = if reached.last_target().is_some() {
            AlgorithmStatus::StoppedUnsafe
        } else {
            AlgorithmStatus::StoppedSafe
        };
        Ok(self.finish(status))
    }

    fn finish(&mut self, status: AlgorithmStatus) -> AlgorithmStatus {
        debug!("reachability finished: {status:?}");
        self.status = status;
        status
    }

    /// Compute and process the successors of `node`, starting at `resume`.
    /// Returns a status if the run must stop before the waitlist is empty; an
    /// unfinished node is then suspended where it stopped.
    fn expand(
        &mut self,
        reached: &mut ReachedSet,
        node: NodeId,
        resume: ResumePoint,
    ) -> Result<Option<AlgorithmStatus>, AnalysisError> {
        let state = reached
            .state(node)
            .ok_or(AnalysisError::UnknownNode(node))?
            .clone();
        let precision = reached
            .precision(node)
            .ok_or(AnalysisError::UnknownNode(node))?
            .clone();
        let cfa = reached.shared_cfa();
        let edges = cfa.outgoing_edges(state.location());
        debug!(
            "expanding node {node} at {} ({} edges, from {resume:?})",
            state.location(),
            edges.len()
        );

        for (i, &edge) in edges.iter().enumerate().skip(resume.edge) {
            if self.shutdown.is_shutdown_requested() {
                warn!("shutdown requested while expanding node {node}");
                let at = ResumePoint {
                    edge: i,
                    successor: if i == resume.edge { resume.successor } else { 0 },
                };
                reached.suspend(node, at)?;
                return Ok(Some(AlgorithmStatus::Aborted(AbortReason::Cancelled)));
            }
            let successors = self
                .analysis
                .successors(&state, &precision, edge, &cfa)
                .map_err(|source| AnalysisError::Transfer {
                    edge: edge.id,
                    location: edge.source,
                    source,
                })?;
            trace!("{edge}: {} successors", successors.len());

            let count = successors.len();
            let skip = if i == resume.edge { resume.successor } else { 0 };
            for (j, successor) in successors.into_iter().enumerate().skip(skip) {
                self.statistics.successors += 1;
                let target = self.process_successor(reached, node, edge, successor, &precision)?;
                if target.is_some() && self.config.stop_after_first_target {
                    let next = if j + 1 < count {
                        Some(ResumePoint { edge: i, successor: j + 1 })
                    } else if i + 1 < edges.len() {
                        Some(ResumePoint { edge: i + 1, successor: 0 })
                    } else {
                        None
                    };
                    if let Some(next) = next {
                        reached.suspend(node, next)?;
                    }
                    return Ok(Some(AlgorithmStatus::StoppedUnsafe));
                }
            }
        }
        Ok(None)
    }

    /// Precision adjustment, merge, stop, and insertion for one successor.
    /// Returns the new node if it is an uncovered target.
    fn process_successor(
        &mut self,
        reached: &mut ReachedSet,
        parent: NodeId,
        edge: EdgeRef<'_>,
        successor: CompositeState,
        precision: &CompositePrecision,
    ) -> Result<Option<NodeId>, AnalysisError> {
        let PrecisionAdjustment {
            state: successor,
            precision: successor_precision,
            action,
            cutoff,
        } = self
            .analysis
            .adjust_precision(successor, precision, reached)
            .map_err(|source| AnalysisError::Transfer {
                edge: edge.id,
                location: edge.source,
                source,
            })?;
        if action == Action::Break {
            self.statistics.breaks += 1;
            if let Some(reason) = cutoff {
                warn!("exploration cut off at {}: {reason}", successor.location());
                self.statistics.cutoffs += 1;
                reached.record_cutoff(reason);
            }
            return Ok(None);
        }

        let is_target = successor.is_target();
        if !is_target {
            if let Some(existing) = self.merge(reached, parent, edge, &successor)? {
                self.statistics.absorbed += 1;
                debug!("successor of {parent} via {} absorbed by node {existing}", edge.id);
                return Ok(None);
            }
        }

        let candidates: Vec<NodeId> = reached.candidates(&successor).collect();
        let states = candidates
            .iter()
            .map(|&id| reached.state(id).ok_or(AnalysisError::UnknownNode(id)))
            .collect::<Result<Vec<_>, _>>()?;
        let coverage = match self.analysis.stop(&successor, &states) {
            StopDecision::Continue => None,
            StopDecision::CoveredBy(i) => Some(Coverage::Node(candidates[i])),
            StopDecision::CoveredByJoin(indices) => Some(Coverage::Join(
                indices.iter().map(|&i| candidates[i]).collect(),
            )),
        };
        if let Some(coverage) = coverage {
            let covered = reached.add_covered(
                successor,
                successor_precision,
                parent,
                edge.id,
                coverage,
            )?;
            self.statistics.covered += 1;
            debug!("node {covered} covered on arrival");
            return Ok(None);
        }

        let location = successor.location();
        let node = reached.add_successor(successor, successor_precision, parent, edge.id)?;
        if is_target {
            reached.mark_target(node)?;
            self.statistics.targets += 1;
            info!("target reached at node {node} ({location})");
            return Ok(Some(node));
        }
        Ok(None)
    }

    /// Merge `successor` into every candidate whose state the merge changes.
    /// A changed node now depends on `parent` and is linked to it. Returns
    /// the first merged node that subsumes `successor`.
    fn merge(
        &mut self,
        reached: &mut ReachedSet,
        parent: NodeId,
        edge: EdgeRef<'_>,
        successor: &CompositeState,
    ) -> Result<Option<NodeId>, AnalysisError> {
        let mut absorbed = None;
        let candidates: Vec<NodeId> = reached.candidates(successor).collect();
        for existing in candidates {
            let old = reached
                .state(existing)
                .ok_or(AnalysisError::UnknownNode(existing))?;
            let merged = self
                .analysis
                .merge(successor, old)
                .map_err(|source| AnalysisError::Transfer {
                    edge: edge.id,
                    location: edge.source,
                    source,
                })?;
            if merged == *old {
                continue;
            }
            if self.config.check_invariants && !self.analysis.is_less_or_equal(old, &merged) {
                return Err(InvariantViolation::MergeNotMonotone { node: existing }.into());
            }
            if merged.is_target() {
                return Err(InvariantViolation::Integrity(format!(
                    "merge turned node {existing} into a target"
                ))
                .into());
            }
            let subsumes = self.analysis.is_less_or_equal(successor, &merged);
            debug!("merged successor into node {existing}");
            reached.replace_state(existing, merged)?;
            reached.add_parent(existing, parent, edge.id)?;
            self.statistics.merges += 1;
            if subsumes && absorbed.is_none() {
                absorbed = Some(existing);
            }
        }
        Ok(absorbed)
    }
}
