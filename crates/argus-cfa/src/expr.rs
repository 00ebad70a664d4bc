//! Integer expressions and predicates used to label CFA edges.

use std::fmt;

/// Integer expression (right-hand side of assignments, call arguments).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Const(i64),
    Var(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn constant(value: i64) -> Self {
        Expr::Const(value)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Self {
        Expr::Add(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: Self) -> Self {
        Expr::Sub(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: Self) -> Self {
        Expr::Mul(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Expr::Neg(Box::new(self))
    }

    pub fn cmp(self, op: CmpOp, other: Self) -> Pred {
        Pred::Cmp(op, self, other)
    }

    pub fn eq(self, other: Self) -> Pred {
        self.cmp(CmpOp::Eq, other)
    }

    pub fn ne(self, other: Self) -> Pred {
        self.cmp(CmpOp::Ne, other)
    }

    pub fn lt(self, other: Self) -> Pred {
        self.cmp(CmpOp::Lt, other)
    }

    pub fn le(self, other: Self) -> Pred {
        self.cmp(CmpOp::Le, other)
    }

    pub fn gt(self, other: Self) -> Pred {
        self.cmp(CmpOp::Gt, other)
    }

    pub fn ge(self, other: Self) -> Pred {
        self.cmp(CmpOp::Ge, other)
    }

    /// Visit every variable read by this expression.
    pub fn for_each_var<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(name) => f(name),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                a.for_each_var(f);
                b.for_each_var(f);
            }
            Expr::Neg(a) => a.for_each_var(f),
        }
    }

    /// The variables read by this expression, in first-occurrence order.
    pub fn vars(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.for_each_var(&mut |v| {
            if !out.contains(&v) {
                out.push(v);
            }
        });
        out
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Const(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Var(value.to_string())
    }
}

/// Comparison operator of an atomic predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// The operator that holds exactly when `self` does not.
    pub fn negate(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Ge => CmpOp::Lt,
        }
    }

    /// The operator obtained by swapping the operands (`a < b` ⇔ `b > a`).
    pub fn flip(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
        }
    }

    pub fn eval(self, a: i64, b: i64) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Boolean condition labelling an assume edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pred {
    True,
    False,
    Cmp(CmpOp, Expr, Expr),
    Not(Box<Pred>),
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
}

impl Pred {
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Pred::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        Pred::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Pred::Or(Box::new(self), Box::new(other))
    }

    /// Push negations down to the atoms (negation normal form).
    pub fn normalize(&self, truth: bool) -> Pred {
        match (self, truth) {
            (Pred::True, true) | (Pred::False, false) => Pred::True,
            (Pred::True, false) | (Pred::False, true) => Pred::False,
            (Pred::Cmp(op, a, b), true) => Pred::Cmp(*op, a.clone(), b.clone()),
            (Pred::Cmp(op, a, b), false) => Pred::Cmp(op.negate(), a.clone(), b.clone()),
            (Pred::Not(p), t) => p.normalize(!t),
            (Pred::And(p, q), true) => p.normalize(true).and(q.normalize(true)),
            (Pred::And(p, q), false) => p.normalize(false).or(q.normalize(false)),
            (Pred::Or(p, q), true) => p.normalize(true).or(q.normalize(true)),
            (Pred::Or(p, q), false) => p.normalize(false).and(q.normalize(false)),
        }
    }

    pub fn for_each_var<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Pred::True | Pred::False => {}
            Pred::Cmp(_, a, b) => {
                a.for_each_var(f);
                b.for_each_var(f);
            }
            Pred::Not(p) => p.for_each_var(f),
            Pred::And(p, q) | Pred::Or(p, q) => {
                p.for_each_var(f);
                q.for_each_var(f);
            }
        }
    }

    pub fn vars(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.for_each_var(&mut |v| {
            if !out.contains(&v) {
                out.push(v);
            }
        });
        out
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a} * {b})"),
            Expr::Neg(a) => write!(f, "-{a}"),
        }
    }
}

impl fmt::Display for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pred::True => write!(f, "true"),
            Pred::False => write!(f, "false"),
            Pred::Cmp(op, a, b) => write!(f, "{a} {} {b}", op.symbol()),
            Pred::Not(p) => write!(f, "!({p})"),
            Pred::And(p, q) => write!(f, "({p} && {q})"),
            Pred::Or(p, q) => write!(f, "({p} || {q})"),
        }
    }
}
