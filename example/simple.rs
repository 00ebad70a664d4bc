use std::sync::Arc;

use argus::prelude::*;

/// Learns every variable assigned along a counterexample; a path that teaches
/// nothing new is taken to be genuine.
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
        log::info!("tracking {refined}");
        Ok(Refinement::Spurious {
            pivot: root,
            component: 0,
            precision: ComponentPrecision::new(refined),
        })
    }
}

/// ```text
/// x := 0; y := 10
/// while (x < 10) { x := x + 1; y := y - 1 }
/// if (y != 0) ERROR
/// ```
fn program() -> Result<Arc<Cfa>, CfaError> {
    let mut b = CfaBuilder::new();
    let main = b.function("main", &[])?;
    let init = b.location("main")?;
    let head = b.location("main")?;
    let body = b.location("main")?;
    let step = b.location("main")?;
    let check = b.location("main")?;
    let error = b.error_location("main", "reach_error")?;
    b.assign(main.entry(), init, "x", Expr::constant(0))?;
    b.assign(init, head, "y", Expr::constant(10))?;
    b.branch(head, body, check, Expr::var("x").lt(Expr::constant(10)))?;
    b.assign(body, step, "x", Expr::var("x").add(Expr::constant(1)))?;
    b.assign(step, head, "y", Expr::var("y").sub(Expr::constant(1)))?;
    b.branch(check, error, main.exit(), Expr::var("y").ne(Expr::constant(0)))?;
    Ok(Arc::new(b.build("main")?))
}

fn main() -> anyhow::Result<()> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let cfa = program()?;
    for merge in [MergeStrategy::Widen, MergeStrategy::Sep] {
        let analysis = CompositeAnalysis::new()
            .with_component(
                IntervalAnalysis::new()
                    .with_merge(merge)
                    .with_precision(IntervalPrecision::none()),
            )
            .with_component(ErrorLocationAnalysis::new())
            .with_component(PathLengthAnalysis);
        let config = ReachabilityConfig::builder().max_iterations(10_000).build();
        let mut verifier = Verifier::new(cfa.clone(), analysis).with_config(config);
        let (report, reached) = verifier.verify_with_refinement(TrackAssigned, Some(8))?;

        println!("== merge {merge:?} ==");
        println!("{}", report.verdict);
        println!("{}", report.statistics);
        println!("reached {} states, {} ARG nodes", report.reached_size, report.arg_size);
        if report.arg_size <= 40 {
            println!("{}", reached.arg().to_dot(&cfa));
        }
    }
    Ok(())
}
