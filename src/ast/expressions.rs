use std::rc::Rc;

use crate::ast::{Span, Special, Statement};

/// Literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 42.0
    /// ```
    Float(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// 'hello'
    /// ```
    String(String),
}

impl Literal {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Integer(n) => Some(*n as f64),
            Literal::Float(n) => Some(*n),
            Literal::String(_) => None,
        }
    }
}

/// A name as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
        }
    }
}

/// The callee of a call node.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// An operator tag, resolved through the dispatch tables
    Special(Special),
    /// Any expression evaluating to a function value
    Expr(Box<Expr>),
}

/// Parameters and body shared by inline functions and named definitions.
///
/// The body holds zero or more assignments followed by one
/// [`StatementKind::Expression`](crate::ast::StatementKind::Expression),
/// whose value is the function's result.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub parameters: Vec<Ident>,
    pub body: Vec<Statement>,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal constant
    Literal(Literal),

    /// Reference to a name in scope
    ///
    /// # Example
    /// ```text
    /// jets
    /// ```
    Identifier(String),

    /// Call of an operator tag or a function value
    ///
    /// # Examples
    /// ```text
    /// a + b           // Call(Special(Plus), [a, b])
    /// x.pt            // Call(Special(Attribute), [x, Identifier("pt")])
    /// sqrt(x)         // Call(Expr(Identifier("sqrt")), [x])
    /// ```
    Call {
        function: Callee,
        arguments: Vec<Expr>,
    },

    /// Anonymous function
    ///
    /// # Examples
    /// ```text
    /// x -> x**2
    /// (a, b) -> a.pt > b.pt
    /// ```
    Inline(Rc<FunctionBody>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Expr::new(ExprKind::Literal(literal), span)
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Expr::new(ExprKind::Identifier(name.into()), span)
    }

    /// Build an operator call whose span covers the operator and every operand.
    pub fn special(special: Special, arguments: Vec<Expr>, operator: Span) -> Self {
        let span = arguments
            .iter()
            .fold(operator, |span, argument| span.to(argument.span));
        Expr::new(
            ExprKind::Call {
                function: Callee::Special(special),
                arguments,
            },
            span,
        )
    }

    /// Build an ordinary call; `closing` is the span of the closing parenthesis.
    pub fn call(function: Expr, arguments: Vec<Expr>, closing: Span) -> Self {
        let span = function.span.to(closing);
        Expr::new(
            ExprKind::Call {
                function: Callee::Expr(Box::new(function)),
                arguments,
            },
            span,
        )
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Identifier(_) | ExprKind::Inline(_) => vec![],
            ExprKind::Call {
                function,
                arguments,
            } => {
                let mut out = Vec::with_capacity(arguments.len() + 1);
                if let Callee::Expr(function) = function {
                    out.push(function.as_ref());
                }
                out.extend(arguments.iter());
                out
            }
        }
    }
}
