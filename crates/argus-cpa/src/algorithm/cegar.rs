use log::{info, warn};

use crate::{
    AlgorithmStatus, AnalysisError, ComponentPrecision, Counterexample, CpaAlgorithm,
    NodeId, ReachedSet, RefinementError, UnknownReason, Verdict,
};

/// A refiner's judgement of a counterexample.
#[derive(Debug, Clone)]
pub enum Refinement {
    /// The path is feasible: report it.
    Genuine,
    /// The path is infeasible. Exploration restarts at `pivot` with
    /// component `component` of the precision replaced by `precision`.
    Spurious {
        pivot: NodeId,
        component: usize,
        precision: ComponentPrecision,
    },
}

/// Decides whether a counterexample is real, and if not, how to refine.
pub trait Refiner {
    fn refine(
        &mut self,
        counterexample: &Counterexample,
        reached: &ReachedSet,
    ) -> Result<Refinement, RefinementError>;
}

/// Counterexample-guided abstraction refinement around a [`CpaAlgorithm`].
pub struct CegarAlgorithm<'a, R> {
    algorithm: CpaAlgorithm<'a>,
    refiner: R,
    max_refinements: Option<usize>,
}

impl<'a, R: Refiner> CegarAlgorithm<'a, R> {
    pub fn new(algorithm: CpaAlgorithm<'a>, refiner: R) -> Self {
        Self {
            algorithm,
            refiner,
            max_refinements: None,
        }
    }

    pub fn with_max_refinements(mut self, rounds: usize) -> Self {
        self.max_refinements = Some(rounds);
        self
    }

    pub fn algorithm(&self) -> &CpaAlgorithm<'a> {
        &self.algorithm
    }

    pub fn refiner(&self) -> &R {
        &self.refiner
    }

    pub fn into_parts(self) -> (CpaAlgorithm<'a>, R) {
        (self.algorithm, self.refiner)
    }

    /// Alternate exploration and refinement until a verdict is reached.
    pub fn run(&mut self, reached: &mut ReachedSet) -> Result<Verdict, AnalysisError> {
        let mut rounds = 0;
        loop {
            match self.algorithm.run(reached)? {
                AlgorithmStatus::StoppedSafe => return Ok(Verdict::safe_unless_incomplete(reached)),
                AlgorithmStatus::Aborted(reason) => {
                    return Ok(Verdict::Unknown(UnknownReason::aborted(reason)));
                }
                AlgorithmStatus::Running | AlgorithmStatus::StoppedUnsafe => {}
            }

            let Some(target) = reached.last_target() else {
                return Ok(Verdict::safe_unless_incomplete(reached));
            };
            let counterexample = Counterexample::extract(reached, target)?;
            let refinement = match self.refiner.refine(&counterexample, reached) {
                Ok(refinement) => refinement,
                Err(err) => {
                    warn!("refinement failed: {err}");
                    return Ok(Verdict::Unknown(UnknownReason::RefinementFailed {
                        message: err.to_string(),
                        counterexample: Some(counterexample),
                    }));
                }
            };

            match refinement {
                Refinement::Genuine => {
                    info!("counterexample to node {target} is genuine");
                    return Ok(Verdict::Unsafe(counterexample));
                }
                Refinement::Spurious {
                    pivot,
                    component,
                    precision,
                } => {
                    if self.max_refinements.is_some_and(|max| rounds >= max) {
                        warn!("refinement limit of {rounds} rounds reached");
                        return Ok(Verdict::Unknown(UnknownReason::RefinementLimit {
                            rounds,
                            counterexample: Some(counterexample),
                        }));
                    }
                    if !counterexample.path().nodes().contains(&pivot) {
                        return Ok(Verdict::Unknown(UnknownReason::RefinementFailed {
                            message: format!("pivot {pivot} is not on the counterexample path"),
                            counterexample: Some(counterexample),
                        }));
                    }
                    rounds += 1;
                    self.algorithm.statistics_mut().refinements += 1;
                    info!("refinement round {rounds}: restarting at node {pivot}");
                    reached.refine(pivot, component, precision)?;
                    if reached.is_target(target) {
                        return Ok(Verdict::Unknown(UnknownReason::RefinementFailed {
                            message: format!("target {target} survived refinement at {pivot}"),
                            counterexample: Some(counterexample),
                        }));
                    }
                }
            }
        }
    }
}
