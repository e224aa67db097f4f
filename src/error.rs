//! Positioned diagnostics for the public API.

use std::fmt;

use crate::{
    ast::{LineIndex, Span},
    evaluator::EvalError,
    lexer::LexError,
    parser::ParseError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source; the program never ran
    Syntax,
    /// Reference to an undefined name
    Name,
    /// Wrong arity, wrong operand type, duplicate name, unsupported method
    Type,
    /// Failure inside an operator, builtin or external function
    Runtime,
    /// An interpreter defect
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Name => "Name",
            ErrorKind::Type => "Type",
            ErrorKind::Runtime => "Runtime",
            ErrorKind::Internal => "Internal",
        };
        write!(f, "{} error", name)
    }
}

/// An error together with the source lines it points at.
///
/// # Rendering
///
/// A span on one line quotes that line and marks the span:
/// ```text
/// Line 2: Name error: no symbol named 'y' in this scope
///     x := y + 1
/// ---------^
/// ```
/// A span over several lines quotes all of them without a marker, and an
/// error without a position is rendered as its message alone.
#[derive(Debug, Clone, PartialEq)]
pub struct AdlError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
    quoted: Vec<String>,
}

impl AdlError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Option<Span>, source: &str) -> Self {
        let quoted = match span {
            Some(span) => source
                .split('\n')
                .skip(span.line.saturating_sub(1))
                .take(span.end_line.saturating_sub(span.line) + 1)
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        AdlError {
            kind,
            message: message.into(),
            span,
            quoted,
        }
    }

    pub fn from_parse(err: ParseError, source: &str) -> Self {
        match err {
            ParseError::Lex(err) => AdlError::from_lex(err, source),
            other => {
                let span = other.span();
                AdlError::new(ErrorKind::Syntax, other.to_string(), span, source)
            }
        }
    }

    pub fn from_lex(err: LexError, source: &str) -> Self {
        let position = err.position();
        let span = LineIndex::new(source).span(position, position + 1);
        AdlError::new(ErrorKind::Syntax, err.to_string(), Some(span), source)
    }

    pub fn from_eval(err: EvalError, source: &str) -> Self {
        let kind = match &err {
            EvalError::Name { .. } => ErrorKind::Name,
            EvalError::Type { .. } => ErrorKind::Type,
            EvalError::Runtime { .. } => ErrorKind::Runtime,
            EvalError::Internal { .. } => ErrorKind::Internal,
        };
        AdlError::new(kind, err.message(), err.span(), source)
    }

    /// 1-based line where the error starts.
    pub fn line(&self) -> Option<usize> {
        self.span.map(|span| span.line)
    }

    /// 0-based column, known only for errors within one line.
    pub fn column(&self) -> Option<usize> {
        self.span
            .filter(|span| !span.is_multiline())
            .map(|span| span.column)
    }
}

impl fmt::Display for AdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(span) = self.span.filter(|_| !self.quoted.is_empty()) else {
            return write!(f, "{}: {}", self.kind, self.message);
        };

        if span.is_multiline() {
            write!(
                f,
                "Lines {}-{}: {}: {}",
                span.line, span.end_line, self.kind, self.message
            )?;
            for line in &self.quoted {
                write!(f, "\n    {}", line)?;
            }
            return Ok(());
        }

        let width = span.end_column.saturating_sub(span.column).max(1);
        write!(
            f,
            "Line {}: {}: {}\n    {}\n{}{}",
            span.line,
            self.kind,
            self.message,
            self.quoted[0],
            "-".repeat(span.column + 4),
            "^".repeat(width)
        )
    }
}

impl std::error::Error for AdlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_marker() {
        let source = "x := 1\ny := zz + 1";
        let span = LineIndex::new(source).span(12, 14);
        let err = AdlError::new(ErrorKind::Name, "no symbol named 'zz' in this scope", Some(span), source);
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(5));
        assert_eq!(
            err.to_string(),
            "Line 2: Name error: no symbol named 'zz' in this scope\n    y := zz + 1\n---------^^"
        );
    }

    #[test]
    fn test_multi_line_range() {
        let source = "a\nb\nc";
        let span = LineIndex::new(source).span(0, 3);
        let err = AdlError::new(ErrorKind::Type, "bad", Some(span), source);
        assert_eq!(err.column(), None);
        assert_eq!(err.to_string(), "Lines 1-2: Type error: bad\n    a\n    b");
    }

    #[test]
    fn test_message_only() {
        let err = AdlError::new(ErrorKind::Runtime, "boom", None, "");
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "Runtime error: boom");
    }
}
