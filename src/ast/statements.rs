use std::rc::Rc;

use regex::Regex;

use crate::ast::{Expr, FunctionBody, Ident, Span};

/// A string literal used as a name in the aggregation tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

/// `target := expression`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Ident,
    pub expression: Expr,
    pub span: Span,
}

/// A binning bound to the expression it bins.
///
/// # Example
/// ```text
/// regular(10, 0.0, 100.0) <- pt
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// The binning constructor call, `regular(...)` or `variable(...)`
    pub binning: Expr,
    pub expression: Expr,
    pub span: Span,
}

/// Kind of statistic a collector accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Count,
    Sum,
    Profile,
    Fraction,
}

impl Statistic {
    pub fn keyword(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Sum => "sum",
            Statistic::Profile => "profile",
            Statistic::Fraction => "fraction",
        }
    }
}

/// Declarative collector.
///
/// # Examples
/// ```text
/// count 'events'
/// sum 'energy' e weight w
/// profile 'response' reco / truth by regular(20, 0, 200) <- truth
/// fraction 'efficiency' passed by variable(0, 10, 50, 200) <- pt
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Collect {
    pub statistic: Statistic,
    pub name: Name,
    /// Absent for `count`, required for the other statistics
    pub expression: Option<Expr>,
    /// Outermost axis first
    pub axes: Vec<Axis>,
    pub weight: Option<Expr>,
}

/// `name in iterable`, one loop variable of a `for` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopVar {
    pub target: Ident,
    pub expression: Expr,
    pub span: Span,
}

/// One labelled set of alternative bindings in a `vary` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub name: Name,
    pub assignments: Vec<Assignment>,
    pub span: Span,
}

/// A glob pattern of a `source` block, compiled once when parsed.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub text: String,
    pub regex: Regex,
    pub span: Span,
}

impl Pattern {
    pub fn matches(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.span == other.span
    }
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Value definition
    ///
    /// # Example
    /// ```text
    /// ht := jets.map(j -> j.pt)
    /// ```
    Define(Assignment),

    /// Function definition
    ///
    /// # Examples
    /// ```text
    /// sq(x) := x**2
    /// f(x) := { y := x + 1; y**2 }
    /// ```
    FunctionDefine {
        target: Ident,
        function: Rc<FunctionBody>,
    },

    /// Result expression; only valid as the last statement of a function body
    Expression(Expr),

    /// Collector
    Collect(Collect),

    /// Index-synchronous loop
    ///
    /// # Example
    /// ```text
    /// for j in jets { count 'jets' by regular(10, 0, 100) <- j.pt }
    /// ```
    For {
        loopvars: Vec<LoopVar>,
        block: Vec<Statement>,
    },

    /// Systematic variations
    ///
    /// # Example
    /// ```text
    /// vary 'nominal': s := 1.0  'up': s := 1.1 { sum 'scaled' s * e }
    /// ```
    Vary {
        variations: Vec<Variation>,
        block: Vec<Statement>,
    },

    /// Named, optionally predicated and binned region
    ///
    /// # Example
    /// ```text
    /// region 'central' abs(eta) < 2.5 { count 'events' }
    /// ```
    Region {
        name: Name,
        predicate: Option<Expr>,
        axes: Vec<Axis>,
        block: Vec<Statement>,
    },

    /// Provenance filter; `inclusive` is false for `not source`
    ///
    /// # Example
    /// ```text
    /// not source 'data*' { count 'simulated' }
    /// ```
    Source {
        patterns: Vec<Pattern>,
        block: Vec<Statement>,
        inclusive: bool,
    },
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Statement { kind, span }
    }

    /// The nested block of a control construct, if any.
    pub fn block(&self) -> Option<&[Statement]> {
        match &self.kind {
            StatementKind::For { block, .. }
            | StatementKind::Vary { block, .. }
            | StatementKind::Region { block, .. }
            | StatementKind::Source { block, .. } => Some(block),
            _ => None,
        }
    }
}

/// A whole program: the top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub block: Vec<Statement>,
    pub span: Span,
}
