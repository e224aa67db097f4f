use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use regex::Regex;
use tracing::debug;

use crate::{
    ast::{
        Assignment, Axis, Callee, Collect, Expr, ExprKind, FunctionBody, Ident, Lexeme, Literal,
        LoopVar, Name, Pattern, Special, Span, Statement, StatementKind, Statistic, Suite, Token,
        Variation,
    },
    lexer::{LexError, Lexer},
};

/// Errors raised while parsing ADL source.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Lex(LexError),
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },
    /// Two statements on one line without a `;` between them
    MissingSeparator { span: Span },
    /// Left-hand side of `:=` is neither a name nor `name(param, ...)`
    InvalidTarget { span: Span },
    /// A parameter name repeated in one parameter list
    InvalidParameters { span: Span },
    /// A function body whose last statement is not an expression
    MissingResult { span: Span },
    InvalidPattern {
        pattern: String,
        message: String,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Lex(_) => None,
            ParseError::UnexpectedToken { span, .. }
            | ParseError::MissingSeparator { span }
            | ParseError::InvalidTarget { span }
            | ParseError::InvalidParameters { span }
            | ParseError::MissingResult { span }
            | ParseError::InvalidPattern { span, .. } => Some(*span),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => write!(f, "{}", err),
            ParseError::UnexpectedToken {
                found, expected, ..
            } => write!(f, "illegal syntax: expected {}, found {}", expected, found),
            ParseError::MissingSeparator { .. } => write!(f, "missing semicolon or newline"),
            ParseError::InvalidTarget { .. } => write!(
                f,
                "can only assign to a name or define a function as name(param, ...)"
            ),
            ParseError::InvalidParameters { .. } => {
                write!(f, "duplicate function parameter")
            }
            ParseError::MissingResult { .. } => {
                write!(f, "function body must end with an expression")
            }
            ParseError::InvalidPattern {
                pattern, message, ..
            } => write!(f, "invalid source pattern '{}': {}", pattern, message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lex(err)
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parse a whole ADL program.
pub fn parse(source: &str) -> ParseResult<Suite> {
    let lexemes = Lexer::new(source).tokenize()?;
    let suite = Parser::new(lexemes).parse_suite()?;
    debug!(statements = suite.block.len(), "parsed program");
    Ok(suite)
}

/// Parse a single expression, rejecting trailing input.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let lexemes = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(lexemes);
    let expr = parser.parse_expression()?;
    parser.expect(Token::Eof, "end of input")?;
    Ok(expr)
}

/// Reject a parameter list that names the same parameter twice.
fn unique_parameters(parameters: &[Ident]) -> ParseResult<()> {
    let mut seen = HashSet::new();
    match parameters.iter().find(|p| !seen.insert(p.name.as_str())) {
        Some(duplicate) => Err(ParseError::InvalidParameters {
            span: duplicate.span,
        }),
        None => Ok(()),
    }
}

/// Translate an fnmatch-style glob into an anchored regular expression.
///
/// `*` matches any run, `?` any single character, `[seq]` a character class
/// and `[!seq]` its complement. Everything else matches literally.
pub fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i + 1;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                } else {
                    let mut class: String = chars[i + 1..j].iter().collect();
                    if let Some(rest) = class.strip_prefix('!') {
                        class = format!("^{}", rest);
                    } else if class.starts_with('^') {
                        class = format!("\\{}", class);
                    }
                    out.push('[');
                    out.push_str(&class.replace('\\', "\\\\"));
                    out.push(']');
                    i = j;
                }
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');
    out
}

pub struct Parser {
    lexemes: Vec<Lexeme>,
    position: usize,
}

impl Parser {
    /// `lexemes` must end with [`Token::Eof`], as produced by [`Lexer::tokenize`].
    pub fn new(lexemes: Vec<Lexeme>) -> Self {
        Parser {
            lexemes,
            position: 0,
        }
    }

    fn lexeme(&self, offset: usize) -> Option<&Lexeme> {
        self.lexemes
            .get(self.position + offset)
            .or_else(|| self.lexemes.last())
    }

    fn current(&self) -> &Token {
        self.lexeme(0).map_or(&Token::Eof, |lexeme| &lexeme.token)
    }

    fn peek(&self, offset: usize) -> &Token {
        self.lexeme(offset).map_or(&Token::Eof, |lexeme| &lexeme.token)
    }

    fn current_span(&self) -> Span {
        self.lexeme(0).map(|lexeme| lexeme.span).unwrap_or_default()
    }

    fn newline_before(&self) -> bool {
        self.lexeme(0).is_some_and(|lexeme| lexeme.newline_before)
    }

    fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.position < self.lexemes.len() {
            self.position += 1;
        }
        span
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn unexpected<T>(&self, expected: &str) -> ParseResult<T> {
        Err(ParseError::UnexpectedToken {
            found: self.current().describe(),
            expected: expected.to_string(),
            span: self.current_span(),
        })
    }

    fn expect(&mut self, expected: Token, description: &str) -> ParseResult<Span> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            self.unexpected(description)
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<Ident> {
        match self.current().clone() {
            Token::Identifier(name) => Ok(Ident::new(name, self.advance())),
            _ => self.unexpected("a name"),
        }
    }

    fn expect_name(&mut self) -> ParseResult<Name> {
        match self.current().clone() {
            Token::String(value) => Ok(Name {
                value,
                span: self.advance(),
            }),
            _ => self.unexpected("a quoted name"),
        }
    }

    // Statements

    pub fn parse_suite(&mut self) -> ParseResult<Suite> {
        let start = self.current_span();
        let block = self.parse_block(&Token::Eof)?;
        let span = block
            .iter()
            .fold(start, |span, statement| span.to(statement.span));
        self.expect(Token::Eof, "end of input")?;
        Ok(Suite { block, span })
    }

    /// Statements up to (not including) `end`, separated by `;` or newlines.
    fn parse_block(&mut self, end: &Token) -> ParseResult<Vec<Statement>> {
        let mut block = Vec::new();
        let mut separated = true;
        loop {
            while self.check(&Token::Semicolon) {
                self.advance();
                separated = true;
            }
            if self.check(end) || self.check(&Token::Eof) {
                return Ok(block);
            }
            if !separated && !self.newline_before() {
                return Err(ParseError::MissingSeparator {
                    span: self.current_span(),
                });
            }
            block.push(self.parse_statement()?);
            separated = false;
        }
    }

    /// `{ statements }`, returning the block and the closing brace's span.
    fn parse_braced_block(&mut self) -> ParseResult<(Vec<Statement>, Span)> {
        self.expect(Token::LBrace, "'{'")?;
        let block = self.parse_block(&Token::RBrace)?;
        let close = self.expect(Token::RBrace, "'}'")?;
        Ok((block, close))
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current() {
            Token::Count => self.parse_collect(Statistic::Count),
            Token::Sum => self.parse_collect(Statistic::Sum),
            Token::Profile => self.parse_collect(Statistic::Profile),
            Token::Fraction => self.parse_collect(Statistic::Fraction),
            Token::Source => {
                let start = self.advance();
                self.parse_source(start, true)
            }
            Token::Not if self.peek(1) == &Token::Source => {
                let start = self.advance();
                self.advance();
                self.parse_source(start, false)
            }
            Token::Region => self.parse_region(),
            Token::Vary => self.parse_vary(),
            Token::For => self.parse_for(),
            _ => {
                let target = self.parse_postfix()?;
                if !self.check(&Token::ColonEqual) {
                    return self.unexpected("':='");
                }
                self.parse_definition(target)
            }
        }
    }

    /// Everything after an already parsed left-hand side of `:=`.
    fn parse_definition(&mut self, target: Expr) -> ParseResult<Statement> {
        let operator = self.expect(Token::ColonEqual, "':='")?;
        match target.kind {
            ExprKind::Identifier(name) => {
                let target = Ident::new(name, target.span);
                let expression = self.parse_expression()?;
                let span = target.span.to(operator).to(expression.span);
                Ok(Statement::new(
                    StatementKind::Define(Assignment {
                        target,
                        expression,
                        span,
                    }),
                    span,
                ))
            }
            ExprKind::Call {
                function: Callee::Expr(function),
                arguments,
            } => {
                let Some(name) = function.as_identifier() else {
                    return Err(ParseError::InvalidTarget { span: target.span });
                };
                let target_ident = Ident::new(name, function.span);
                let parameters = arguments
                    .iter()
                    .map(|argument| match argument.as_identifier() {
                        Some(name) => Ok(Ident::new(name, argument.span)),
                        None => Err(ParseError::InvalidTarget { span: argument.span }),
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                unique_parameters(&parameters)?;
                let (body, end) = self.parse_function_body()?;
                let span = target.span.to(operator).to(end);
                Ok(Statement::new(
                    StatementKind::FunctionDefine {
                        target: target_ident,
                        function: Rc::new(FunctionBody { parameters, body }),
                    },
                    span,
                ))
            }
            _ => Err(ParseError::InvalidTarget { span: target.span }),
        }
    }

    /// Either `{ assignments; expression }` or a single expression.
    fn parse_function_body(&mut self) -> ParseResult<(Vec<Statement>, Span)> {
        if !self.check(&Token::LBrace) {
            let expression = self.parse_expression()?;
            let span = expression.span;
            return Ok((
                vec![Statement::new(StatementKind::Expression(expression), span)],
                span,
            ));
        }

        let open = self.advance();
        let mut body: Vec<Statement> = Vec::new();
        let mut separated = true;
        loop {
            while self.check(&Token::Semicolon) {
                self.advance();
                separated = true;
            }
            if self.check(&Token::RBrace) {
                break;
            }
            if body
                .last()
                .is_some_and(|last| matches!(last.kind, StatementKind::Expression(_)))
            {
                return self.unexpected("'}' after the result expression");
            }
            if !separated && !self.newline_before() {
                return Err(ParseError::MissingSeparator {
                    span: self.current_span(),
                });
            }
            let expression = self.parse_expression()?;
            if self.check(&Token::ColonEqual) {
                body.push(self.parse_definition(expression)?);
            } else {
                let span = expression.span;
                body.push(Statement::new(StatementKind::Expression(expression), span));
            }
            separated = false;
        }
        let close = self.advance();

        match body.last() {
            Some(Statement {
                kind: StatementKind::Expression(_),
                ..
            }) => Ok((body, close)),
            _ => Err(ParseError::MissingResult {
                span: open.to(close),
            }),
        }
    }

    fn parse_collect(&mut self, statistic: Statistic) -> ParseResult<Statement> {
        let start = self.advance();
        let name = self.expect_name()?;
        let mut end = name.span;

        let expression = match statistic {
            Statistic::Count => None,
            _ => {
                let expression = self.parse_expression()?;
                end = expression.span;
                Some(expression)
            }
        };

        let axes = self.parse_axes()?;
        if let Some(axis) = axes.last() {
            end = axis.span;
        }

        let weight = if self.check(&Token::Weight) {
            self.advance();
            let weight = self.parse_expression()?;
            end = weight.span;
            Some(weight)
        } else {
            None
        };

        Ok(Statement::new(
            StatementKind::Collect(Collect {
                statistic,
                name,
                expression,
                axes,
                weight,
            }),
            start.to(end),
        ))
    }

    /// True when the upcoming tokens read `name( ... ) <-`.
    fn axis_ahead(&self) -> bool {
        if !matches!(self.current(), Token::Identifier(_)) || self.peek(1) != &Token::LParen {
            return false;
        }
        let mut depth = 0usize;
        let mut offset = 1;
        loop {
            match self.peek(offset) {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek(offset + 1) == &Token::LeftArrow;
                    }
                }
                Token::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    /// Optional `by binning <- expr binning <- expr ...`.
    fn parse_axes(&mut self) -> ParseResult<Vec<Axis>> {
        if !self.check(&Token::By) {
            return Ok(Vec::new());
        }
        self.advance();

        let mut axes = vec![self.parse_axis()?];
        while self.axis_ahead() {
            axes.push(self.parse_axis()?);
        }
        Ok(axes)
    }

    fn parse_axis(&mut self) -> ParseResult<Axis> {
        let binning = self.parse_postfix()?;
        self.expect(Token::LeftArrow, "'<-'")?;
        let expression = self.parse_expression()?;
        let span = binning.span.to(expression.span);
        Ok(Axis {
            binning,
            expression,
            span,
        })
    }

    fn parse_source(&mut self, start: Span, inclusive: bool) -> ParseResult<Statement> {
        let mut patterns = Vec::new();
        loop {
            let name = self.expect_name()?;
            let regex =
                Regex::new(&glob_to_regex(&name.value)).map_err(|err| ParseError::InvalidPattern {
                    pattern: name.value.clone(),
                    message: err.to_string(),
                    span: name.span,
                })?;
            patterns.push(Pattern {
                text: name.value,
                regex,
                span: name.span,
            });
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let (block, close) = self.parse_braced_block()?;
        Ok(Statement::new(
            StatementKind::Source {
                patterns,
                block,
                inclusive,
            },
            start.to(close),
        ))
    }

    fn parse_region(&mut self) -> ParseResult<Statement> {
        let start = self.advance();
        let name = self.expect_name()?;
        let predicate = if self.check(&Token::By) || self.check(&Token::LBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let axes = self.parse_axes()?;
        let (block, close) = self.parse_braced_block()?;
        Ok(Statement::new(
            StatementKind::Region {
                name,
                predicate,
                axes,
                block,
            },
            start.to(close),
        ))
    }

    fn parse_vary(&mut self) -> ParseResult<Statement> {
        let start = self.advance();
        let mut variations = Vec::new();

        while matches!(self.current(), Token::String(_)) {
            let name = self.expect_name()?;
            let mut end = name.span;
            if self.check(&Token::Colon) {
                end = self.advance();
            }

            let mut assignments: Vec<Assignment> = Vec::new();
            let mut separated = true;
            while matches!(self.current(), Token::Identifier(_) | Token::Semicolon) {
                if self.check(&Token::Semicolon) {
                    self.advance();
                    separated = true;
                    continue;
                }
                if !separated && !self.newline_before() {
                    return Err(ParseError::MissingSeparator {
                        span: self.current_span(),
                    });
                }
                let target = self.expect_identifier()?;
                self.expect(Token::ColonEqual, "':='")?;
                let expression = self.parse_expression()?;
                let span = target.span.to(expression.span);
                end = span;
                assignments.push(Assignment {
                    target,
                    expression,
                    span,
                });
                separated = false;
            }

            let span = name.span.to(end);
            variations.push(Variation {
                name,
                assignments,
                span,
            });
        }

        if variations.is_empty() {
            return self.unexpected("a quoted variation name");
        }

        let (block, close) = self.parse_braced_block()?;
        Ok(Statement::new(
            StatementKind::Vary { variations, block },
            start.to(close),
        ))
    }

    fn parse_for(&mut self) -> ParseResult<Statement> {
        let start = self.advance();
        let mut loopvars = Vec::new();
        loop {
            let target = self.expect_identifier()?;
            self.expect(Token::In, "'in'")?;
            let expression = self.parse_expression()?;
            let span = target.span.to(expression.span);
            loopvars.push(LoopVar {
                target,
                expression,
                span,
            });
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let (block, close) = self.parse_braced_block()?;
        Ok(Statement::new(
            StatementKind::For { loopvars, block },
            start.to(close),
        ))
    }

    // Expressions

    /// Number of tokens in an upcoming inline-function parameter list
    /// (`x ->` or `(a, b) ->`), arrow excluded.
    fn inline_ahead(&self) -> Option<usize> {
        match self.current() {
            Token::Identifier(_) if self.peek(1) == &Token::RightArrow => Some(1),
            Token::LParen => {
                let mut offset = 1;
                loop {
                    match self.peek(offset) {
                        Token::RParen => break,
                        Token::Identifier(_) | Token::Comma => offset += 1,
                        _ => return None,
                    }
                }
                (self.peek(offset + 1) == &Token::RightArrow).then_some(offset + 1)
            }
            _ => None,
        }
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        if self.inline_ahead().is_some() {
            return self.parse_inline();
        }
        self.parse_or()
    }

    fn parse_inline(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut parameters = Vec::new();
        if self.check(&Token::LParen) {
            self.advance();
            while !self.check(&Token::RParen) {
                parameters.push(self.expect_identifier()?);
                if !self.check(&Token::RParen) {
                    self.expect(Token::Comma, "','")?;
                }
            }
            self.advance();
        } else {
            parameters.push(self.expect_identifier()?);
        }
        self.expect(Token::RightArrow, "'->'")?;

        unique_parameters(&parameters)?;

        let (body, end) = self.parse_function_body()?;
        Ok(Expr::new(
            ExprKind::Inline(Rc::new(FunctionBody { parameters, body })),
            start.to(end),
        ))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&Token::Or) {
            let operator = self.advance();
            let right = self.parse_and()?;
            left = Expr::special(Special::Or, vec![left, right], operator);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.check(&Token::And) {
            let operator = self.advance();
            let right = self.parse_not()?;
            left = Expr::special(Special::And, vec![left, right], operator);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Not) {
            let operator = self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::special(Special::Not, vec![operand], operator));
        }
        self.parse_comparison()
    }

    fn comparison_operator(&self) -> Option<Special> {
        match self.current() {
            Token::EqEq => Some(Special::Equal),
            Token::NotEq => Some(Special::NotEqual),
            Token::Lt => Some(Special::Less),
            Token::LtEq => Some(Special::LessEqual),
            Token::Gt => Some(Special::Greater),
            Token::GtEq => Some(Special::GreaterEqual),
            _ => None,
        }
    }

    /// `a < b <= c` becomes `a < b and b <= c`.
    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_arith()?;
        let mut chain: Option<Expr> = None;
        while let Some(special) = self.comparison_operator() {
            let operator = self.advance();
            let right = self.parse_arith()?;
            let comparison = Expr::special(special, vec![left, right.clone()], operator);
            chain = Some(match chain {
                None => comparison,
                Some(previous) => {
                    let span = previous.span.to(comparison.span);
                    Expr::special(Special::And, vec![previous, comparison], span)
                }
            });
            left = right;
        }
        Ok(chain.unwrap_or(left))
    }

    fn parse_arith(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let special = match self.current() {
                Token::Plus => Special::Plus,
                Token::Minus => Special::Minus,
                _ => return Ok(left),
            };
            let operator = self.advance();
            let right = self.parse_term()?;
            left = Expr::special(special, vec![left, right], operator);
        }
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let special = match self.current() {
                Token::Star => Special::Times,
                Token::Slash => Special::Divide,
                Token::Percent => Special::Modulo,
                _ => return Ok(left),
            };
            let operator = self.advance();
            let right = self.parse_factor()?;
            left = Expr::special(special, vec![left, right], operator);
        }
    }

    /// Unary `+`/`-`; applied to a numeric literal they fold into the literal.
    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let special = match self.current() {
            Token::Plus => Special::UnaryPlus,
            Token::Minus => Special::UnaryMinus,
            _ => return self.parse_power(),
        };
        let operator = self.advance();
        let operand = self.parse_factor()?;
        let span = operator.to(operand.span);

        let folded = match (special, operand.as_literal()) {
            (Special::UnaryPlus, Some(Literal::Integer(_) | Literal::Float(_))) => {
                operand.as_literal().cloned()
            }
            (Special::UnaryMinus, Some(Literal::Integer(n))) => {
                n.checked_neg().map(Literal::Integer)
            }
            (Special::UnaryMinus, Some(Literal::Float(n))) => Some(Literal::Float(-n)),
            _ => None,
        };
        Ok(match folded {
            Some(literal) => Expr::literal(literal, span),
            None => Expr::special(special, vec![operand], operator),
        })
    }

    /// `**` binds tighter than unary minus on its left and is right-associative.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if self.check(&Token::Power) {
            let operator = self.advance();
            let exponent = self.parse_factor()?;
            return Ok(Expr::special(Special::Power, vec![base, exponent], operator));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.current() {
                Token::Dot => {
                    let operator = self.advance();
                    let name = self.expect_identifier()?;
                    let name = Expr::identifier(name.name, name.span);
                    expr = Expr::special(Special::Attribute, vec![expr, name], operator);
                }
                Token::LBracket => {
                    let operator = self.advance();
                    let index = self.parse_expression()?;
                    let close = self.expect(Token::RBracket, "']'")?;
                    let span = expr.span.to(close);
                    expr = Expr::special(Special::Subscript, vec![expr, index], operator);
                    expr.span = expr.span.to(span);
                }
                Token::LParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    let close = self.expect(Token::RParen, "')'")?;
                    expr = Expr::call(expr, arguments, close);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated call arguments; a trailing comma is allowed.
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        while !self.check(&Token::RParen) {
            arguments.push(self.parse_expression()?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        Ok(arguments)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        let literal = match self.current().clone() {
            Token::Integer(n) => Literal::Integer(n),
            Token::Float(n) => Literal::Float(n),
            Token::String(s) => Literal::String(s),
            Token::Identifier(name) => {
                self.advance();
                return Ok(Expr::identifier(name, span));
            }
            Token::LParen => {
                self.advance();
                let mut inner = self.parse_expression()?;
                let close = self.expect(Token::RParen, "')'")?;
                inner.span = span.to(inner.span).to(close);
                return Ok(inner);
            }
            _ => return self.unexpected("an expression"),
        };
        self.advance();
        Ok(Expr::literal(literal, span))
    }
}
