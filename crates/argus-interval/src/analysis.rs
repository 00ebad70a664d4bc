use argus_cfa::{Cfa, EdgeKind, EdgeRef, Expr, Location, Pred, return_variable};
use argus_cpa::{Cpa, Lattice, MergeStrategy, Successors, TransferContext, TransferError};
use log::trace;
use smallvec::smallvec;

use crate::{
    Interval, IntervalPrecision, IntervalState, interval_add, interval_mul, interval_neg,
    interval_sub,
};

/// Interval value analysis over the integer variables of the program.
///
/// All functions share one variable namespace: a call binds the callee's
/// parameters on top of the caller's bindings, and a return copies the
/// callee's return variable into the result variable at the return site.
#[derive(Debug, Clone, Default)]
pub struct IntervalAnalysis {
    merge: MergeStrategy,
    precision: IntervalPrecision,
}

impl IntervalAnalysis {
    /// Track every variable and keep states separate at merge points.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    /// Precision the exploration starts from.
    pub fn with_precision(mut self, precision: IntervalPrecision) -> Self {
        self.precision = precision;
        self
    }
}

/// Evaluate `expr` over the bindings of `state`.
pub fn eval(expr: &Expr, state: &IntervalState) -> Interval {
    match expr {
        Expr::Const(c) => Interval::constant(*c),
        Expr::Var(v) => state.get(v),
        Expr::Add(a, b) => interval_add(&eval(a, state), &eval(b, state)),
        Expr::Sub(a, b) => interval_sub(&eval(a, state), &eval(b, state)),
        Expr::Mul(a, b) => interval_mul(&eval(a, state), &eval(b, state)),
        Expr::Neg(a) => interval_neg(&eval(a, state)),
    }
}

/// Strengthen `state` with `pred`, which must be in negation normal form.
///
/// Returns `None` if no concrete state described by `state` satisfies `pred`.
pub fn assume(
    state: &IntervalState,
    pred: &Pred,
    precision: &IntervalPrecision,
) -> Option<IntervalState> {
    match pred {
        Pred::True => Some(state.clone()),
        Pred::False => None,
        Pred::Not(p) => assume(state, &p.normalize(false), precision),
        Pred::And(p, q) => assume(&assume(state, p, precision)?, q, precision),
        Pred::Or(p, q) => match (assume(state, p, precision), assume(state, q, precision)) {
            (Some(a), Some(b)) => Some(a.join(&b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        },
        Pred::Cmp(op, lhs, rhs) => {
            let left = eval(lhs, state);
            let right = eval(rhs, state);
            let left = left.restrict(*op, &right);
            if left.is_empty() {
                return None;
            }
            let right = right.restrict(op.flip(), &left);
            if right.is_empty() {
                return None;
            }
            let mut next = state.clone();
            for (expr, value) in [(lhs, left), (rhs, right)] {
                if let Expr::Var(var) = expr {
                    if precision.tracks(var) && !next.set(var, next.get(var).meet(&value)) {
                        return None;
                    }
                }
            }
            Some(next)
        }
    }
}

fn assign(state: &mut IntervalState, var: &str, value: Interval, precision: &IntervalPrecision) {
    if precision.tracks(var) {
        // An empty value only arises from an empty operand, which states never hold.
        if !state.set(var, value) {
            state.forget(var);
        }
    } else {
        state.forget(var);
    }
}

impl Cpa for IntervalAnalysis {
    type State = IntervalState;
    type Precision = IntervalPrecision;

    fn name(&self) -> &str {
        "interval"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> IntervalState {
        IntervalState::new()
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) -> IntervalPrecision {
        self.precision.clone()
    }

    fn successors(
        &self,
        state: &IntervalState,
        precision: &IntervalPrecision,
        edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<IntervalState>, TransferError> {
        let mut next = state.clone();
        match edge.kind {
            EdgeKind::Blank(_) => {}
            EdgeKind::Assign { var, expr } => {
                let value = eval(expr, state);
                assign(&mut next, var, value, precision);
            }
            EdgeKind::Havoc { var } => next.forget(var),
            EdgeKind::Assume { pred, truth } => match assume(state, &pred.normalize(*truth), precision) {
                Some(refined) => next = refined,
                None => {
                    trace!("interval: {} is infeasible from {state}", edge.kind);
                    return Ok(Successors::new());
                }
            },
            EdgeKind::Call { args, params, .. } => {
                let values: Vec<Interval> = args.iter().map(|arg| eval(arg, state)).collect();
                for (param, value) in params.iter().zip(values) {
                    assign(&mut next, param, value, precision);
                }
            }
            EdgeKind::Return { callee, result, .. } => {
                let ret = return_variable(callee);
                if let Some(var) = result {
                    let value = state.get(&ret);
                    assign(&mut next, var, value, precision);
                }
                next.forget(&ret);
            }
        }
        trace!("interval: {} gives {next}", edge.kind);
        Ok(smallvec![next])
    }

    fn merge_strategy(&self) -> MergeStrategy {
        self.merge
    }

    fn widen(&self, previous: &IntervalState, next: &IntervalState) -> IntervalState {
        previous.widen(next)
    }
}
