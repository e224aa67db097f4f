//! # ADL - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree for ADL, the aggregation
//! description language. An ADL program declares which statistics to collect
//! from a stream of records; the tree built here is walked once to shape the
//! aggregation tree and then once per record to fill it.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[span]** - Source positions and the line table used for diagnostics
//! - **[operators]** - Special operator tags resolved through dispatch tables
//! - **[expressions]** - Expression nodes (literals, identifiers, calls, inline functions)
//! - **[statements]** - Statements (assignments, collectors, control blocks)
//!
//! ## Quick Start
//!
//! ```text
//! count 'events'
//! region 'central' abs(eta) < 2.5 by regular(10, 0, 100) <- pt {
//!     profile 'mass' m
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Everything is a call
//!
//! Operators are not separate node types. `a + b` parses into a
//! [`ExprKind::Call`] whose callee is the [`Special::Plus`] tag, and
//! `x.phi` into a call of [`Special::Attribute`]. The evaluator resolves
//! each tag through an ordered table of signatures, so one syntactic
//! operator can mean different things for different runtime shapes.
//!
//! ### Positions
//!
//! Every node carries a [`Span`]. A parent's span always encloses the spans
//! of its children; [`Span::to`] merges two spans.

pub mod expressions;
pub mod operators;
pub mod span;
pub mod statements;
pub mod tokens;

pub use expressions::{Callee, Expr, ExprKind, FunctionBody, Ident, Literal};
pub use operators::Special;
pub use span::{LineIndex, Span};
pub use statements::{
    Assignment, Axis, Collect, LoopVar, Name, Pattern, Statement, StatementKind, Statistic, Suite,
    Variation,
};
pub use tokens::{Lexeme, Token};
