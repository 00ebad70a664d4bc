//! Small control-flow automata used across the test suites.
//!
//! Every fixture builds a fresh CFA with deterministic location and edge ids,
//! so tests may compare ids across runs.

use std::sync::Arc;

use argus_cfa::{Cfa, CfaBuilder, CfaError, Expr, Location};

/// Label of the error location in every fixture that has one.
pub const ERROR_LABEL: &str = "reach_error";

fn finish(b: CfaBuilder) -> Arc<Cfa> {
    Arc::new(expect_built(b.build("main")))
}

fn expect_built<T>(result: Result<T, CfaError>) -> T {
    result.unwrap_or_else(|err| panic!("fixture CFA is malformed: {err}"))
}

/// `entry --skip--> exit`
pub fn straight_line() -> Arc<Cfa> {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    expect_built(b.blank(main.entry(), main.exit(), "skip"));
    finish(b)
}

pub struct ErrorPath {
    pub cfa: Arc<Cfa>,
    pub entry: Location,
    pub error: Location,
    pub exit: Location,
}

/// `entry --fail--> ERROR --skip--> exit`
pub fn error_path() -> ErrorPath {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    let error = expect_built(b.error_location("main", ERROR_LABEL));
    expect_built(b.blank(main.entry(), error, "fail"));
    expect_built(b.blank(error, main.exit(), "skip"));
    ErrorPath {
        cfa: finish(b),
        entry: main.entry(),
        error,
        exit: main.exit(),
    }
}

pub struct Diamond {
    pub cfa: Arc<Cfa>,
    pub entry: Location,
    pub then_loc: Location,
    pub else_loc: Location,
    pub join: Location,
    pub exit: Location,
}

/// ```text
/// entry --[x < 0]--> then --x := 1--> join --skip--> exit
///   \--[!(x < 0)]--> else --x := 2--/
/// ```
pub fn diamond() -> Diamond {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    let then_loc = expect_built(b.location("main"));
    let else_loc = expect_built(b.location("main"));
    let join = expect_built(b.location("main"));
    expect_built(b.branch(
        main.entry(),
        then_loc,
        else_loc,
        Expr::var("x").lt(Expr::constant(0)),
    ));
    expect_built(b.assign(then_loc, join, "x", Expr::constant(1)));
    expect_built(b.assign(else_loc, join, "x", Expr::constant(2)));
    expect_built(b.blank(join, main.exit(), "skip"));
    Diamond {
        cfa: finish(b),
        entry: main.entry(),
        then_loc,
        else_loc,
        join,
        exit: main.exit(),
    }
}

pub struct SelfLoop {
    pub cfa: Arc<Cfa>,
    pub head: Location,
}

/// A single location whose only edge leads back to itself.
pub fn self_loop() -> SelfLoop {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    expect_built(b.blank(main.entry(), main.entry(), "spin"));
    SelfLoop {
        cfa: finish(b),
        head: main.entry(),
    }
}

pub struct CountingLoop {
    pub cfa: Arc<Cfa>,
    pub head: Location,
    pub check: Location,
    pub error: Location,
    pub exit: Location,
}

/// ```text
/// i := 0; while (i < bound) { i := i + 1 }; if (i != bound) ERROR
/// ```
pub fn counting_loop(bound: i64) -> CountingLoop {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    let head = expect_built(b.location("main"));
    let body = expect_built(b.location("main"));
    let check = expect_built(b.location("main"));
    let error = expect_built(b.error_location("main", ERROR_LABEL));
    expect_built(b.assign(main.entry(), head, "i", Expr::constant(0)));
    expect_built(b.branch(head, body, check, Expr::var("i").lt(Expr::constant(bound))));
    expect_built(b.assign(
        body,
        head,
        "i",
        Expr::var("i").add(Expr::constant(1)),
    ));
    expect_built(b.branch(check, error, main.exit(), Expr::var("i").ne(Expr::constant(bound))));
    CountingLoop {
        cfa: finish(b),
        head,
        check,
        error,
        exit: main.exit(),
    }
}

pub struct GuardedError {
    pub cfa: Arc<Cfa>,
    pub guard: Location,
    pub error: Location,
}

/// ```text
/// x := 5; if (x > 10) ERROR
/// ```
///
/// Safe, but only for an analysis that tracks `x`.
pub fn guarded_error() -> GuardedError {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    let guard = expect_built(b.location("main"));
    let error = expect_built(b.error_location("main", ERROR_LABEL));
    expect_built(b.assign(main.entry(), guard, "x", Expr::constant(5)));
    expect_built(b.branch(
        guard,
        error,
        main.exit(),
        Expr::var("x").gt(Expr::constant(10)),
    ));
    GuardedError {
        cfa: finish(b),
        guard,
        error,
    }
}

pub struct TwoCalls {
    pub cfa: Arc<Cfa>,
    pub first_return: Location,
    pub second_return: Location,
    pub error: Location,
}

/// ```text
/// inc(a) { return a + 1 }
/// y := inc(0); z := inc(y); if (z != 2) ERROR
/// ```
pub fn two_calls() -> TwoCalls {
    let mut b = CfaBuilder::new();
    let main = expect_built(b.function("main", &[]));
    let inc = expect_built(b.function("inc", &["a"]));
    let first_return = expect_built(b.location("main"));
    let second_return = expect_built(b.location("main"));
    let error = expect_built(b.error_location("main", ERROR_LABEL));
    expect_built(b.ret(inc.entry(), "inc", Expr::var("a").add(Expr::constant(1))));
    expect_built(b.call(
        main.entry(),
        first_return,
        "inc",
        vec![Expr::constant(0)],
        Some("y"),
    ));
    expect_built(b.call(
        first_return,
        second_return,
        "inc",
        vec![Expr::var("y")],
        Some("z"),
    ));
    expect_built(b.branch(
        second_return,
        error,
        main.exit(),
        Expr::var("z").ne(Expr::constant(2)),
    ));
    TwoCalls {
        cfa: finish(b),
        first_return,
        second_return,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_have_expected_shape() {
        assert_eq!(straight_line().num_locations(), 2);

        let e = error_path();
        assert_eq!(e.cfa[e.error].error_label(), Some(ERROR_LABEL));

        let d = diamond();
        assert_eq!(d.cfa.incoming_edges(d.join).len(), 2);

        let s = self_loop();
        let edges = s.cfa.outgoing_edges(s.head);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, s.head);

        let c = two_calls();
        assert_eq!(c.cfa.error_locations().collect::<Vec<_>>(), vec![c.error]);
    }
}
