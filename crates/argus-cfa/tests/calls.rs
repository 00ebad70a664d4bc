use argus_cfa::{CfaBuilder, EdgeKind, Expr, return_variable};

/// main: entry --call inc(x)--> ... inc.exit --return--> after --> exit
/// inc(a): entry --ret a + 1--> exit
fn build_call_program() -> (argus_cfa::Cfa, argus_cfa::Location) {
    let mut b = CfaBuilder::new();
    let main = b.function("main", &[]).unwrap();
    let inc = b.function("inc", &["a"]).unwrap();
    let after = b.location("main").unwrap();
    b.call(main.entry(), after, "inc", vec![Expr::var("x")], Some("y"))
        .unwrap();
    b.blank(after, main.exit(), "done").unwrap();
    b.ret(inc.entry(), "inc", Expr::var("a").add(Expr::constant(1)))
        .unwrap();
    (b.build("main").unwrap(), after)
}

#[test]
fn call_and_return_edges_are_paired() {
    let (cfa, after) = build_call_program();
    let inc = cfa.function("inc").unwrap();

    let calls = cfa.outgoing_edges(cfa.entry());
    assert_eq!(calls.len(), 1);
    let call = calls[0];
    assert_eq!(call.target, inc.entry());
    match call.kind {
        EdgeKind::Call {
            callee,
            params,
            return_site,
            ..
        } => {
            assert_eq!(callee, "inc");
            assert_eq!(params, &vec!["a".to_string()]);
            assert_eq!(*return_site, after);
        }
        other => panic!("expected call edge, got {other:?}"),
    }

    let returns = cfa.outgoing_edges(inc.exit());
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].target, after);
    assert!(returns[0].kind.is_return());
}

#[test]
fn edge_labels_render_like_source() {
    let (cfa, _) = build_call_program();
    let inc = cfa.function("inc").unwrap();
    let rendered: Vec<String> = [cfa.entry(), inc.entry(), inc.exit()]
        .into_iter()
        .flat_map(|loc| cfa.outgoing_edges(loc))
        .map(|e| e.kind.to_string())
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    call inc(x)
    inc::ret := (a + 1)
    y := return inc
    ");
    assert_eq!(return_variable("inc"), "inc::ret");
}

#[test]
fn every_location_gets_a_distinct_rank() {
    let (cfa, _) = build_call_program();
    let mut ranks: Vec<u32> = cfa.locations().map(|l| cfa.reverse_postorder(l)).collect();
    ranks.sort_unstable();
    let expected: Vec<u32> = (0..cfa.num_locations() as u32).collect();
    assert_eq!(ranks, expected);
}
