use argus_analyses::{ErrorLocationAnalysis, ErrorState};
use argus_cfa::{CfaEdge, Location};
use argus_cpa::{
    AnalysisError, Arg, CallStack, ComponentState, CompositeAnalysis, CompositeState, Coverage,
    InvariantViolation, NodeId, Verifier,
};
use argus_test_utils::fixtures::{self, ERROR_LABEL};
use argus_test_utils::{UnitAnalysis, UnitState};
use smallvec::smallvec;

fn unit_at(loc: Location) -> CompositeState {
    CompositeState::new(loc, CallStack::new(), vec![ComponentState::new(UnitState)])
}

fn target_at(loc: Location) -> CompositeState {
    CompositeState::new(
        loc,
        CallStack::new(),
        vec![ComponentState::new(ErrorState::violated(ERROR_LABEL))],
    )
}

/// ```text
///        root
///       /    \
///      a      b
///       \    /
///        shared -- leaf
/// ```
struct Shape {
    arg: Arg,
    root: NodeId,
    a: NodeId,
    b: NodeId,
    shared: NodeId,
    leaf: NodeId,
    edges: [CfaEdge; 3],
}

fn shape() -> Shape {
    let d = fixtures::diamond();
    let out = d.cfa.outgoing_edges(d.entry);
    let into_join = d.cfa.incoming_edges(d.join);
    let to_exit = d.cfa.outgoing_edges(d.join)[0].id;
    // root -> a -> shared -> leaf
    let edges = [out[0].id, into_join[0].id, to_exit];

    let mut arg = Arg::new();
    let root = arg.add_root(unit_at(d.entry));
    let a = arg.add_node(unit_at(d.then_loc));
    let b = arg.add_node(unit_at(d.else_loc));
    let shared = arg.add_node(unit_at(d.join));
    let leaf = arg.add_node(unit_at(d.exit));
    arg.add_edge(root, a, edges[0]).unwrap();
    arg.add_edge(root, b, out[1].id).unwrap();
    arg.add_edge(a, shared, edges[1]).unwrap();
    arg.add_edge(b, shared, into_join[1].id).unwrap();
    arg.add_edge(shared, leaf, edges[2]).unwrap();
    Shape {
        arg,
        root,
        a,
        b,
        shared,
        leaf,
        edges,
    }
}

#[test]
fn links_are_mirrored_and_deduplicated() {
    let mut s = shape();
    s.arg.add_edge(s.root, s.a, s.edges[0]).unwrap();
    let root = s.arg.node(s.root).unwrap();
    assert_eq!(root.children().len(), 2);
    assert_eq!(s.arg.node(s.shared).unwrap().parents().len(), 2);
    assert_eq!(s.arg.roots().collect::<Vec<_>>(), vec![s.root]);
    s.arg.check_integrity().unwrap();
}

#[test]
fn cover_rejects_broken_coverage() {
    let mut s = shape();
    let d = fixtures::diamond();
    let target = s.arg.add_node(target_at(d.join));
    s.arg.add_edge(s.b, target, s.edges[2]).unwrap();

    let err = s.arg.cover(s.a, Coverage::Node(s.a)).unwrap_err();
    assert!(matches!(err, AnalysisError::Invariant(InvariantViolation::SelfCover(n)) if n == s.a));

    let err = s.arg.cover(s.leaf, Coverage::Node(target)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Invariant(InvariantViolation::CoveredByTarget { .. })
    ));

    s.arg.cover(s.b, Coverage::Node(s.a)).unwrap();
    let err = s.arg.cover(s.b, Coverage::Node(s.root)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Invariant(InvariantViolation::AlreadyCovered(_))
    ));
    let err = s.arg.cover(s.leaf, Coverage::Node(s.b)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Invariant(InvariantViolation::CoveringChain { .. })
    ));

    assert_eq!(s.arg.node(s.b).unwrap().covered_by(), Some(s.a));
    assert_eq!(s.arg.node(s.a).unwrap().covers(), [s.b]);
    s.arg.check_integrity().unwrap();

    assert!(s.arg.uncover(s.b));
    assert!(!s.arg.uncover(s.b));
    assert!(s.arg.node(s.a).unwrap().covers().is_empty());
}

#[test]
fn join_coverage_records_every_covering_node() {
    let mut s = shape();
    s.arg.cover(s.leaf, Coverage::Join(smallvec![s.a, s.b])).unwrap();
    assert!(s.arg.node(s.leaf).unwrap().is_covered());
    assert_eq!(s.arg.node(s.leaf).unwrap().covered_by(), None);
    assert_eq!(s.arg.node(s.b).unwrap().covers(), [s.leaf]);
    s.arg.check_integrity().unwrap();
}

#[test]
fn subtree_removal_takes_every_derived_node() {
    let mut s = shape();
    let removal = s.arg.remove_subtree(s.a).unwrap();
    assert_eq!(removal.removed, vec![s.a, s.shared, s.leaf]);
    assert_eq!(removal.reopened, vec![s.root, s.b]);
    assert!(s.arg.contains(s.b));
    assert!(s.arg.node(s.b).unwrap().children().is_empty());
    s.arg.check_integrity().unwrap();

    let removal = s.arg.remove_subtree(s.b).unwrap();
    assert_eq!(removal.removed, vec![s.b]);
    assert_eq!(s.arg.len(), 1);
    assert!(s.arg.node(s.root).unwrap().children().is_empty());
    s.arg.check_integrity().unwrap();
}

#[test]
fn subtree_removal_spares_other_roots() {
    let mut s = shape();
    let d = fixtures::diamond();
    let second = s.arg.add_root(unit_at(d.then_loc));
    s.arg.add_edge(second, s.shared, s.edges[1]).unwrap();
    s.arg.add_edge(s.leaf, second, s.edges[0]).unwrap();

    let removal = s.arg.remove_subtree(s.b).unwrap();
    assert_eq!(removal.removed, vec![s.b, s.shared, s.leaf]);
    assert!(s.arg.contains(second));
    assert!(s.arg.node(second).unwrap().parents().is_empty());
    assert_eq!(s.arg.roots().collect::<Vec<_>>(), vec![s.root, second]);
    s.arg.check_integrity().unwrap();
}

#[test]
fn subtree_removal_uncovers_survivors() {
    let mut s = shape();
    s.arg.remove_subtree(s.shared).unwrap();
    let d = fixtures::diamond();
    let late = s.arg.add_node(unit_at(d.then_loc));
    s.arg.add_edge(s.b, late, s.edges[0]).unwrap();
    s.arg.cover(late, Coverage::Node(s.a)).unwrap();

    let removal = s.arg.remove_subtree(s.a).unwrap();
    assert_eq!(removal.removed, vec![s.a]);
    assert_eq!(removal.uncovered, vec![late]);
    assert!(!s.arg.node(late).unwrap().is_covered());
    s.arg.check_integrity().unwrap();
}

#[test]
fn path_to_walks_back_to_the_root() {
    let s = shape();
    let path = s.arg.path_to(s.leaf).unwrap();
    assert_eq!(path.nodes(), [s.root, s.a, s.shared, s.leaf]);
    assert_eq!(path.edges(), s.edges);
    assert_eq!(path.len(), 3);
    assert_eq!(path.first(), s.root);

    let trivial = s.arg.path_to(s.root).unwrap();
    assert!(trivial.is_empty());
    assert_eq!(trivial.nodes(), [s.root]);
}

#[test]
fn unknown_nodes_are_reported() {
    let mut s = shape();
    s.arg.remove_subtree(s.leaf).unwrap();
    assert!(matches!(
        s.arg.path_to(s.leaf),
        Err(AnalysisError::UnknownNode(n)) if n == s.leaf
    ));
}

#[test]
fn dot_export_of_a_violation() {
    let e = fixtures::error_path();
    let analysis = CompositeAnalysis::new()
        .with_component(UnitAnalysis)
        .with_component(ErrorLocationAnalysis::new());
    let (report, reached) = Verifier::new(e.cfa.clone(), analysis)
        .verify_with_reached()
        .unwrap();
    assert!(report.verdict.is_unsafe());

    insta::assert_snapshot!(reached.arg().to_dot(&e.cfa), @r#"
    digraph ARG {
      node [shape=box];
      0 [label="0 @ N0"];
      1 [label="1 @ N2", style=filled, fillcolor=red];
      0 -> 1 [label="fail"];
    }
    "#);
    insta::assert_snapshot!(report.verdict.to_string(), @r"
    UNSAFE: counterexample to node 1 (reach_error)
      N0 -[fail]-> N2
    ");
}
