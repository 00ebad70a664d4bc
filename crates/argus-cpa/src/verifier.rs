use std::sync::Arc;

use argus_cfa::{Cfa, Location};
use log::info;

use crate::{
    AlgorithmStatus, AnalysisError, CegarAlgorithm, CompositeAnalysis, Counterexample,
    CpaAlgorithm, ReachabilityConfig, ReachabilityStatistics, ReachedSet, Refiner,
    ShutdownNotifier, StatisticsSink, UnknownReason, VerificationReport, Verdict,
};

/// One-stop driver: seeds a reached set from the CFA, runs the algorithm
/// (optionally inside CEGAR) and condenses the outcome into a
/// [`VerificationReport`].
///
/// Transfer failures become `UNKNOWN`; invariant violations are returned as
/// errors since they indicate a broken component analysis.
pub struct Verifier {
    cfa: Arc<Cfa>,
    analysis: CompositeAnalysis,
    config: ReachabilityConfig,
    shutdown: ShutdownNotifier,
    entries: Vec<Location>,
    sink: Option<Box<dyn StatisticsSink>>,
}

impl Verifier {
    pub fn new(cfa: Arc<Cfa>, analysis: CompositeAnalysis) -> Self {
        let entries = vec![cfa.entry()];
        Self {
            cfa,
            analysis,
            config: ReachabilityConfig::default(),
            shutdown: ShutdownNotifier::default(),
            entries,
            sink: None,
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

    /// Start from these locations instead of the main entry, one initial
    /// state each.
    pub fn with_entries(mut self, entries: Vec<Location>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_statistics_sink(mut self, sink: impl StatisticsSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn cfa(&self) -> &Cfa {
        &self.cfa
    }

    pub fn analysis(&self) -> &CompositeAnalysis {
        &self.analysis
    }

    pub fn shutdown_notifier(&self) -> &ShutdownNotifier {
        &self.shutdown
    }

    fn algorithm(&self) -> CpaAlgorithm<'_> {
        CpaAlgorithm::new(&self.analysis)
            .with_config(self.config.clone())
            .with_shutdown(self.shutdown.clone())
    }

    /// Plain reachability: the first target found is reported as UNSAFE.
    ///
    /// Returns the final reached set alongside the report for inspection.
    pub fn verify_with_reached(&mut self) -> Result<(VerificationReport, ReachedSet), AnalysisError> {
        let mut algorithm = self.algorithm();
        let mut reached = algorithm.seeded_reached_set(self.cfa.clone(), &self.entries)?;
        let verdict = match algorithm.run(&mut reached) {
            Ok(status) => verdict_for(status, &reached)?,
            Err(err) => transfer_failure(err)?,
        };
        let statistics = algorithm.statistics().clone();
        drop(algorithm);
        Ok((self.report(verdict, statistics, &reached), reached))
    }

    pub fn verify(&mut self) -> Result<VerificationReport, AnalysisError> {
        self.verify_with_reached().map(|(report, _)| report)
    }

    /// Reachability inside a CEGAR loop driven by `refiner`.
    pub fn verify_with_refinement<R: Refiner>(
        &mut self,
        refiner: R,
        max_refinements: Option<usize>,
    ) -> Result<(VerificationReport, ReachedSet), AnalysisError> {
        let algorithm = self.algorithm();
        let mut reached = algorithm.seeded_reached_set(self.cfa.clone(), &self.entries)?;
        let mut cegar = CegarAlgorithm::new(algorithm, refiner);
        if let Some(max) = max_refinements {
            cegar = cegar.with_max_refinements(max);
        }
        let verdict = match cegar.run(&mut reached) {
            Ok(verdict) => verdict,
            Err(err) => transfer_failure(err)?,
        };
        let statistics = cegar.algorithm().statistics().clone();
        drop(cegar);
        Ok((self.report(verdict, statistics, &reached), reached))
    }

    fn report(
        &mut self,
        verdict: Verdict,
        statistics: ReachabilityStatistics,
        reached: &ReachedSet,
    ) -> VerificationReport {
        info!("verdict: {verdict}");
        if let Some(sink) = self.sink.as_mut() {
            sink.record(&statistics);
        }
        VerificationReport {
            verdict,
            statistics,
            reached_size: reached.len(),
            arg_size: reached.arg().len(),
        }
    }
}

fn verdict_for(status: AlgorithmStatus, reached: &ReachedSet) -> Result<Verdict, AnalysisError> {
    Ok(match status {
        AlgorithmStatus::StoppedSafe => Verdict::safe_unless_incomplete(reached),
        AlgorithmStatus::StoppedUnsafe => match reached.last_target() {
            Some(target) => Verdict::Unsafe(Counterexample::extract(reached, target)?),
            None => Verdict::safe_unless_incomplete(reached),
        },
        AlgorithmStatus::Aborted(reason) => Verdict::Unknown(UnknownReason::aborted(reason)),
        AlgorithmStatus::Running => Verdict::Unknown(UnknownReason::TransferFailure(
            "exploration did not finish".to_string(),
        )),
    })
}

/// Transfer failures end the run with UNKNOWN; anything else is a defect.
fn transfer_failure(err: AnalysisError) -> Result<Verdict, AnalysisError> {
    match err {
        AnalysisError::Transfer { .. } => {
            log::error!("{err}");
            Ok(Verdict::Unknown(UnknownReason::TransferFailure(err.to_string())))
        }
        other => Err(other),
    }
}
