use std::cell::RefCell;
use std::rc::Rc;

use argus::prelude::*;
use argus_test_utils::fixtures::{self, ERROR_LABEL};
use argus_test_utils::UnitAnalysis;
use test_log::test;

fn intervals(merge: MergeStrategy) -> CompositeAnalysis {
    CompositeAnalysis::new()
        .with_component(IntervalAnalysis::new().with_merge(merge))
        .with_component(ErrorLocationAnalysis::new())
}

/// Adds every variable assigned along the counterexample to the tracked
/// set. A path that teaches nothing new is reported as genuine.
struct TrackAssigned;

impl Refiner for TrackAssigned {
    fn refine(
        &mut self,
        counterexample: &Counterexample,
        reached: &ReachedSet,
    ) -> Result<Refinement, RefinementError> {
        let root = counterexample.path().first();
        let current = reached
            .precision(root)
            .and_then(|p| p.get::<IntervalPrecision>())
            .cloned()
            .ok_or_else(|| RefinementError::Inconclusive("no interval precision".to_string()))?;

        let mut refined = current.clone();
        for &edge in counterexample.path().edges() {
            if let Some(EdgeRef {
                kind: EdgeKind::Assign { var, .. },
                ..
            }) = reached.cfa().edge(edge)
            {
                refined = refined.with_variable(var.clone());
            }
        }
        if refined == current {
            return Ok(Refinement::Genuine);
        }
        Ok(Refinement::Spurious {
            pivot: root,
            component: 0,
            precision: ComponentPrecision::new(refined),
        })
    }
}

fn coarse() -> CompositeAnalysis {
    CompositeAnalysis::new()
        .with_component(IntervalAnalysis::new().with_precision(IntervalPrecision::none()))
        .with_component(ErrorLocationAnalysis::new())
}

#[test]
fn straight_line_program_is_safe() {
    let cfa = fixtures::straight_line();
    let analysis = CompositeAnalysis::new().with_component(UnitAnalysis);
    let report = Verifier::new(cfa, analysis).verify().unwrap();
    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.reached_size, 2);
}

#[test]
fn trivial_violation_is_unsafe() {
    let e = fixtures::error_path();
    let report = Verifier::new(e.cfa.clone(), intervals(MergeStrategy::Sep))
        .verify()
        .unwrap();
    let cex = report.verdict.counterexample().unwrap();
    assert_eq!(cex.path().edges(), [e.cfa.outgoing_edges(e.entry)[0].id]);
    assert_eq!(cex.violations(), [ERROR_LABEL.to_string()]);
}

#[test]
fn bounded_loop_is_safe_with_separate_states() {
    let l = fixtures::counting_loop(3);
    let (report, reached) = Verifier::new(l.cfa.clone(), intervals(MergeStrategy::Sep))
        .verify_with_reached()
        .unwrap();
    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(reached.count_at(l.head), 4);
    assert_eq!(reached.count_at(l.error), 0);
}

#[test]
fn widening_loses_the_loop_bound() {
    let l = fixtures::counting_loop(3);
    let report = Verifier::new(l.cfa.clone(), intervals(MergeStrategy::Widen))
        .verify()
        .unwrap();
    assert!(report.verdict.is_unsafe());
}

#[test]
fn two_calls_compute_the_right_result() {
    let c = fixtures::two_calls();
    let (report, reached) = Verifier::new(c.cfa.clone(), intervals(MergeStrategy::Sep))
        .verify_with_reached()
        .unwrap();
    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(reached.count_at(c.error), 0);
}

#[test]
fn counterexample_through_calls() {
    let c = fixtures::two_calls();
    let analysis = CompositeAnalysis::new()
        .with_component(UnitAnalysis)
        .with_component(ErrorLocationAnalysis::new());
    let report = Verifier::new(c.cfa.clone(), analysis).verify().unwrap();

    insta::assert_snapshot!(report.verdict.to_string(), @r"
    UNSAFE: counterexample to node 7 (reach_error)
      N0 -[call inc(0)]-> N2
      N2 -[inc::ret := (a + 1)]-> N3
      N3 -[y := return inc]-> N4
      N4 -[call inc(y)]-> N2
      N2 -[inc::ret := (a + 1)]-> N3
      N3 -[z := return inc]-> N5
      N5 -[[z != 2]]-> N6
    ");
}

#[test]
fn refinement_removes_a_spurious_error() {
    let g = fixtures::guarded_error();
    let (report, reached) = Verifier::new(g.cfa.clone(), coarse())
        .verify_with_refinement(TrackAssigned, Some(4))
        .unwrap();
    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.statistics.refinements, 1);
    assert_eq!(reached.count_at(g.error), 0);
}

#[test]
fn refinement_learns_the_loop_counter() {
    let l = fixtures::counting_loop(3);
    let (report, _) = Verifier::new(l.cfa.clone(), coarse())
        .verify_with_refinement(TrackAssigned, Some(4))
        .unwrap();
    assert_eq!(report.verdict, Verdict::Safe);
    assert_eq!(report.statistics.refinements, 1);
}

#[test]
fn refinement_confirms_a_real_error() {
    let e = fixtures::error_path();
    let (report, _) = Verifier::new(e.cfa.clone(), coarse())
        .verify_with_refinement(TrackAssigned, Some(4))
        .unwrap();
    assert!(report.verdict.is_unsafe());
    assert_eq!(report.statistics.refinements, 0);
}

#[test]
fn statistics_reach_the_sink() {
    let d = fixtures::diamond();
    let recorded = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&recorded);
    let report = Verifier::new(d.cfa.clone(), intervals(MergeStrategy::Join))
        .with_statistics_sink(move |s: &ReachabilityStatistics| sink.borrow_mut().push(s.clone()))
        .verify()
        .unwrap();
    assert_eq!(*recorded.borrow(), vec![report.statistics]);
}
