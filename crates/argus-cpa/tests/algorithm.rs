use std::sync::Arc;

use argus_analyses::{ErrorLocationAnalysis, PathLength, PathLengthAnalysis};
use argus_cfa::{Cfa, CfaBuilder, EdgeKind, EdgeRef, Location};
use argus_cpa::{
    AbortReason, AbstractState, AlgorithmStatus, AnalysisError, CallStack, ComponentState,
    CompositeAnalysis, CompositeState, Counterexample, Cpa, CpaAlgorithm, InvariantViolation,
    Lattice, MergeStrategy, ReachabilityConfig, ReachedSet, Refinement, ResumePoint,
    ShutdownNotifier, Successors, TransferContext, TransferError, UnknownReason, Verdict,
    Verifier, WaitlistOrder,
};
use argus_interval::{Interval, IntervalAnalysis, IntervalState};
use argus_test_utils::fixtures::{self, ERROR_LABEL};
use argus_test_utils::{ScriptedRefiner, UnitAnalysis, UnitState};
use smallvec::smallvec;
use test_log::test;

fn unit() -> CompositeAnalysis {
    CompositeAnalysis::new().with_component(UnitAnalysis)
}

fn unit_with_errors() -> CompositeAnalysis {
    unit().with_component(ErrorLocationAnalysis::new())
}

fn x_at(reached: &ReachedSet, location: Location) -> Vec<Interval> {
    reached
        .live_nodes()
        .filter_map(|node| reached.state(node))
        .filter(|state| state.location() == location)
        .filter_map(|state| state.get::<IntervalState>())
        .map(|values| values.get("x"))
        .collect()
}

#[test]
fn straight_line_is_safe() {
    let cfa = fixtures::straight_line();
    let (report, reached) = Verifier::new(cfa, unit()).verify_with_reached().unwrap();

    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.reached_size, 2);
    assert_eq!(report.arg_size, 2);
    assert_eq!(report.statistics.iterations, 2);
    assert!(!reached.has_waiting());
}

#[test]
fn reaching_an_error_location_is_unsafe() {
    let e = fixtures::error_path();
    let mut verifier = Verifier::new(e.cfa.clone(), unit_with_errors());
    let (report, reached) = verifier.verify_with_reached().unwrap();

    let cex = report.verdict.counterexample().unwrap();
    let fail = e.cfa.outgoing_edges(e.entry)[0].id;
    assert_eq!(cex.path().edges(), [fail]);
    assert_eq!(cex.violations(), [ERROR_LABEL.to_string()]);
    assert!(reached.is_target(cex.target()));
    assert_eq!(reached.count_at(e.exit), 0);
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn joining_at_the_merge_point_keeps_one_state() {
    let d = fixtures::diamond();
    let analysis =
        CompositeAnalysis::new().with_component(IntervalAnalysis::new().with_merge(MergeStrategy::Join));
    let mut verifier = Verifier::new(d.cfa.clone(), analysis);
    let (report, reached) = verifier.verify_with_reached().unwrap();

    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(reached.count_at(d.join), 1);
    assert_eq!(x_at(&reached, d.join), vec![Interval::new(1, 2)]);
    assert_eq!(x_at(&reached, d.exit), vec![Interval::new(1, 2)]);
    assert_eq!(report.statistics.absorbed, 1);
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn separate_merge_keeps_both_branches() {
    let d = fixtures::diamond();
    let analysis = CompositeAnalysis::new().with_component(IntervalAnalysis::new());
    let (_, reached) = Verifier::new(d.cfa.clone(), analysis)
        .verify_with_reached()
        .unwrap();

    let mut at_join = x_at(&reached, d.join);
    at_join.sort_by_key(|x| x.as_constant());
    assert_eq!(at_join, vec![Interval::constant(1), Interval::constant(2)]);
}

#[test]
fn a_loop_closes_by_coverage() {
    let s = fixtures::self_loop();
    let mut verifier = Verifier::new(s.cfa.clone(), unit());
    let (report, reached) = verifier.verify_with_reached().unwrap();

    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.statistics.iterations, 1);
    assert_eq!(report.statistics.covered, 1);
    assert_eq!(report.reached_size, 1);
    assert_eq!(report.arg_size, 2);

    let (covered, node) = reached
        .arg()
        .nodes()
        .find(|(_, n)| n.is_covered())
        .unwrap();
    assert!(!reached.is_live(covered));
    assert_eq!(node.covered_by(), reached.live_nodes().next());
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn path_lengths_do_not_block_coverage() {
    let s = fixtures::self_loop();
    let mut verifier = Verifier::new(s.cfa.clone(), unit().with_component(PathLengthAnalysis));
    let (report, reached) = verifier.verify_with_reached().unwrap();

    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.statistics.covered, 1);
    let (_, node) = reached
        .arg()
        .nodes()
        .find(|(_, n)| n.is_covered())
        .unwrap();
    let covering = reached.state(node.covered_by().unwrap()).unwrap();
    assert_eq!(node.state().get::<PathLength>(), Some(&PathLength(1)));
    assert_eq!(covering.get::<PathLength>(), Some(&PathLength(0)));
    assert!(verifier.analysis().is_less_or_equal(node.state(), covering));
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn an_initial_target_is_reported() {
    let e = fixtures::error_path();
    let mut verifier =
        Verifier::new(e.cfa.clone(), unit_with_errors()).with_entries(vec![e.error]);
    let (report, reached) = verifier.verify_with_reached().unwrap();

    let cex = report.verdict.counterexample().unwrap();
    assert!(report.verdict.is_unsafe());
    assert!(cex.path().is_empty());
    assert_eq!(cex.path().first(), cex.target());
    assert_eq!(cex.violations(), [ERROR_LABEL.to_string()]);
    assert!(reached.is_target(cex.target()));
    assert!(!reached.has_waiting());
    assert_eq!(report.statistics.iterations, 0);
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn shutdown_before_the_first_pop_cancels() {
    let cfa = fixtures::straight_line();
    let shutdown = ShutdownNotifier::new();
    shutdown.request_shutdown();
    let report = Verifier::new(cfa, unit())
        .with_shutdown(shutdown)
        .verify()
        .unwrap();

    assert_eq!(report.verdict, Verdict::Unknown(UnknownReason::Cancelled));
    assert_eq!(report.reached_size, 1);
    assert_eq!(report.statistics.iterations, 0);
}

#[test]
fn the_iteration_budget_is_enforced() {
    let cfa = fixtures::straight_line();
    let analysis = unit();
    let config = ReachabilityConfig::builder().max_iterations(1).build();
    let mut algorithm = CpaAlgorithm::new(&analysis).with_config(config);
    let mut reached = algorithm.initial_reached_set(cfa).unwrap();

    let status = algorithm.run(&mut reached).unwrap();
    assert_eq!(status, AlgorithmStatus::Aborted(AbortReason::ResourceExhausted));
    assert_eq!(algorithm.status(), status);
    assert_eq!(algorithm.statistics().iterations, 1);
    assert!(reached.has_waiting());
}

#[test]
fn every_waitlist_order_agrees_on_the_verdict() {
    for order in [
        WaitlistOrder::BreadthFirst,
        WaitlistOrder::DepthFirst,
        WaitlistOrder::ReversePostorder,
        WaitlistOrder::DistanceToError,
    ] {
        let config = ReachabilityConfig::builder().waitlist_order(order).build();
        let e = fixtures::error_path();
        let report = Verifier::new(e.cfa.clone(), unit_with_errors())
            .with_config(config.clone())
            .verify()
            .unwrap();
        assert!(report.verdict.is_unsafe(), "{order:?}");

        let d = fixtures::diamond();
        let report = Verifier::new(d.cfa.clone(), unit_with_errors())
            .with_config(config)
            .verify()
            .unwrap();
        assert_eq!(report.verdict, Verdict::Safe, "{order:?}");
    }
}

/// `entry --fail--> ERROR`, `entry --fail again--> ERROR2`
fn two_errors() -> Arc<Cfa> {
    let mut b = CfaBuilder::new();
    let main = b.function("main", &[]).unwrap();
    let first = b.error_location("main", ERROR_LABEL).unwrap();
    let second = b.error_location("main", "assert_fail").unwrap();
    b.blank(main.entry(), first, "fail").unwrap();
    b.blank(main.entry(), second, "fail again").unwrap();
    Arc::new(b.build("main").unwrap())
}

#[test]
fn exploring_past_the_first_target_collects_them_all() {
    let config = ReachabilityConfig::builder()
        .stop_after_first_target(false)
        .build();
    let mut verifier = Verifier::new(two_errors(), unit_with_errors()).with_config(config);
    let (report, reached) = verifier.verify_with_reached().unwrap();

    assert_eq!(report.statistics.targets, 2);
    assert_eq!(reached.targets().count(), 2);
    let cex = report.verdict.counterexample().unwrap();
    assert_eq!(cex.target(), reached.last_target().unwrap());
    assert_eq!(cex.violations(), ["assert_fail".to_string()]);
    reached.check_integrity(verifier.analysis()).unwrap();
}

#[test]
fn stopping_at_a_target_keeps_the_parent_unfinished() {
    let analysis = unit_with_errors();
    let mut algorithm = CpaAlgorithm::new(&analysis);
    let mut reached = algorithm.initial_reached_set(two_errors()).unwrap();

    let status = algorithm.run(&mut reached).unwrap();
    assert_eq!(status, AlgorithmStatus::StoppedUnsafe);
    assert_eq!(reached.targets().count(), 1);
    let root = reached.arg().roots().next().unwrap();
    assert!(reached.is_waiting(root));
    assert!(!reached.is_waiting(reached.last_target().unwrap()));
    reached.check_integrity(&analysis).unwrap();
}

#[test]
fn resuming_after_a_target_continues_where_it_stopped() {
    let analysis = unit_with_errors();
    let mut algorithm = CpaAlgorithm::new(&analysis);
    let mut reached = algorithm.initial_reached_set(two_errors()).unwrap();
    let root = reached.arg().roots().next().unwrap();

    assert_eq!(algorithm.run(&mut reached).unwrap(), AlgorithmStatus::StoppedUnsafe);
    assert_eq!(reached.targets().count(), 1);
    assert!(reached.is_waiting(root));
    assert_eq!(
        reached.resume_point(root),
        Some(ResumePoint {
            edge: 1,
            successor: 0
        })
    );
    reached.check_integrity(&analysis).unwrap();

    assert_eq!(algorithm.run(&mut reached).unwrap(), AlgorithmStatus::StoppedUnsafe);
    assert_eq!(reached.targets().count(), 2);
    assert!(!reached.has_waiting());
    assert_eq!(reached.resume_point(root), None);

    // Nothing is left to expand, and no target was produced twice.
    assert_eq!(algorithm.run(&mut reached).unwrap(), AlgorithmStatus::StoppedUnsafe);
    assert_eq!(reached.arg().len(), 3);
    let violations: Vec<String> = reached
        .targets()
        .flat_map(|t| reached.state(t).unwrap().violations())
        .collect();
    assert_eq!(violations, [ERROR_LABEL.to_string(), "assert_fail".to_string()]);
    reached.check_integrity(&analysis).unwrap();
}

/// Follows every edge but cannot interpret havoc.
struct NoHavoc;

impl Cpa for NoHavoc {
    type State = UnitState;
    type Precision = ();

    fn name(&self) -> &str {
        "no-havoc"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> UnitState {
        UnitState
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        _state: &UnitState,
        _precision: &(),
        edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<UnitState>, TransferError> {
        match edge.kind {
            EdgeKind::Havoc { var } => Err(TransferError::Unsupported(format!("havoc {var}"))),
            _ => Ok(smallvec![UnitState]),
        }
    }
}

fn havoc_program() -> Arc<Cfa> {
    let mut b = CfaBuilder::new();
    let main = b.function("main", &[]).unwrap();
    let mid = b.location("main").unwrap();
    b.blank(main.entry(), mid, "skip").unwrap();
    b.havoc(mid, main.exit(), "x").unwrap();
    Arc::new(b.build("main").unwrap())
}

#[test]
fn a_transfer_failure_aborts_the_run() {
    let analysis = CompositeAnalysis::new().with_component(NoHavoc);
    let mut algorithm = CpaAlgorithm::new(&analysis);
    let mut reached = algorithm.initial_reached_set(havoc_program()).unwrap();

    let err = algorithm.run(&mut reached).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Transfer {
            source: TransferError::Unsupported(_),
            ..
        }
    ));
    assert_eq!(
        algorithm.status(),
        AlgorithmStatus::Aborted(AbortReason::Failure)
    );

    let report = Verifier::new(havoc_program(), CompositeAnalysis::new().with_component(NoHavoc))
        .verify()
        .unwrap();
    match report.verdict {
        Verdict::Unknown(UnknownReason::TransferFailure(message)) => {
            assert!(message.contains("unsupported edge: havoc x"), "{message}");
        }
        other => panic!("expected a transfer failure, got {other}"),
    }
}

#[test]
fn a_transfer_failure_during_refinement_is_unknown() {
    let refiner = ScriptedRefiner::new(
        |_call: usize, _cex: &Counterexample, _reached: &ReachedSet| Ok(Refinement::Genuine),
    );
    let (report, _) =
        Verifier::new(havoc_program(), CompositeAnalysis::new().with_component(NoHavoc))
            .verify_with_refinement(refiner, None)
            .unwrap();
    match report.verdict {
        Verdict::Unknown(UnknownReason::TransferFailure(message)) => {
            assert!(message.contains("unsupported edge: havoc x"), "{message}");
        }
        other => panic!("expected a transfer failure, got {other}"),
    }
}

#[test]
fn a_mistyped_initial_state_fails_the_run() {
    let cfa = fixtures::straight_line();
    let analysis = unit_with_errors();
    let mut algorithm = CpaAlgorithm::new(&analysis);
    let mut reached = ReachedSet::new(cfa.clone(), WaitlistOrder::default());
    let short = CompositeState::new(
        cfa.entry(),
        CallStack::new(),
        vec![ComponentState::new(UnitState)],
    );
    reached
        .add_initial(short, analysis.initial_precision(&cfa, cfa.entry()))
        .unwrap();

    let err = algorithm.run(&mut reached).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Transfer {
            source: TransferError::ComponentMismatch { index: 1, .. },
            ..
        }
    ));
    assert_eq!(
        algorithm.status(),
        AlgorithmStatus::Aborted(AbortReason::Failure)
    );
}

/// `main() { rec() }`, `rec() { rec() }`
fn unbounded_recursion() -> Arc<Cfa> {
    let mut b = CfaBuilder::new();
    let main = b.function("main", &[]).unwrap();
    let rec = b.function("rec", &[]).unwrap();
    let main_after = b.location("main").unwrap();
    let rec_after = b.location("rec").unwrap();
    b.call(main.entry(), main_after, "rec", vec![], None).unwrap();
    b.call(rec.entry(), rec_after, "rec", vec![], None).unwrap();
    b.blank(rec_after, rec.exit(), "skip").unwrap();
    b.blank(main_after, main.exit(), "skip").unwrap();
    Arc::new(b.build("main").unwrap())
}

#[test]
fn recursion_is_cut_by_the_call_depth_bound() {
    let analysis = unit().with_max_call_depth(3);
    let mut algorithm = CpaAlgorithm::new(&analysis);
    let mut reached = algorithm.initial_reached_set(unbounded_recursion()).unwrap();

    let err = algorithm.run(&mut reached).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Transfer {
            source: TransferError::CallDepthExceeded { depth: 4, max: 3 },
            ..
        }
    ));
    assert!(reached.live_nodes().all(|n| {
        reached
            .state(n)
            .is_some_and(|s| s.call_stack().depth() <= 3)
    }));
}

#[test]
fn returns_go_back_to_their_own_call_site() {
    let c = fixtures::two_calls();
    let inc = c.cfa.function("inc").unwrap();
    let mut verifier = Verifier::new(c.cfa.clone(), unit());
    let (report, reached) = verifier.verify_with_reached().unwrap();

    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(reached.count_at(c.first_return), 1);
    assert_eq!(reached.count_at(c.second_return), 1);
    // One context per call site.
    assert_eq!(reached.count_at(inc.entry()), 2);
    assert_eq!(reached.count_at(inc.exit()), 2);
    for node in reached.live_nodes() {
        let state = reached.state(node).unwrap();
        if state.location() == c.first_return || state.location() == c.second_return {
            assert!(state.call_stack().is_empty());
        }
    }
    reached.check_integrity(verifier.analysis()).unwrap();
}

/// A level ordered by `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Level(usize);

impl Lattice for Level {
    fn join(&self, other: &Self) -> Self {
        Level(self.0.max(other.0))
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0 <= other.0
    }
}

impl AbstractState for Level {}

/// Records the location each state came from, and widens by forgetting it.
struct Forgetful;

impl Cpa for Forgetful {
    type State = Level;
    type Precision = ();

    fn name(&self) -> &str {
        "forgetful"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> Level {
        Level(0)
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        _state: &Level,
        _precision: &(),
        edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<Level>, TransferError> {
        Ok(smallvec![Level(edge.source.raw())])
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Widen
    }

    fn widen(&self, _previous: &Level, _next: &Level) -> Level {
        Level(0)
    }
}

#[test]
fn a_shrinking_merge_is_reported() {
    let d = fixtures::diamond();
    let config = ReachabilityConfig::builder().check_invariants(true).build();
    let err = Verifier::new(d.cfa.clone(), CompositeAnalysis::new().with_component(Forgetful))
        .with_config(config)
        .verify()
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Invariant(InvariantViolation::MergeNotMonotone { .. })
    ));
}

#[test]
fn runs_are_deterministic() {
    let run = || {
        let d = fixtures::diamond();
        let analysis = CompositeAnalysis::new()
            .with_component(IntervalAnalysis::new().with_merge(MergeStrategy::Join))
            .with_component(ErrorLocationAnalysis::new());
        let (report, reached) = Verifier::new(d.cfa.clone(), analysis)
            .verify_with_reached()
            .unwrap();
        (report, reached.arg().to_dot(&d.cfa))
    };
    let (first, first_dot) = run();
    let (second, second_dot) = run();
    assert_eq!(first, second);
    assert_eq!(first_dot, second_dot);
}

#[test]
fn an_empty_composite_is_rejected() {
    let cfa = fixtures::straight_line();
    let err = Verifier::new(cfa, CompositeAnalysis::new()).verify().unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyComposite));
}
