use std::fmt;

use crate::ast::{Lexeme, LineIndex, Span, Token};

/// Character offset into the source.
pub type Position = usize;

/// Errors raised while tokenizing ADL source.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// A character that cannot start any token
    UnexpectedChar { ch: char, position: Position },

    /// A string literal without its closing quote
    UnterminatedString { position: Position },

    /// A backslash followed by an unsupported character
    InvalidEscape { ch: char, position: Position },

    /// A numeric literal that does not fit its type
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, .. } => write!(f, "illegal character '{}'", ch),
            LexError::UnterminatedString { .. } => write!(f, "unterminated string"),
            LexError::InvalidEscape { ch, .. } => write!(f, "invalid escape sequence \\{}", ch),
            LexError::InvalidNumber { text, .. } => write!(f, "invalid number {}", text),
        }
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    lines: LineIndex,
    newline_pending: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            lines: LineIndex::new(""),
            newline_pending: false,
        }
    }

    /// Line table covering everything consumed so far.
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.lines.start_line(self.position + 1);
        }
        self.position += 1;
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn span_from(&self, start: usize) -> Span {
        self.lines.span(start, self.position)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current_char() {
            match ch {
                '\n' => {
                    self.newline_pending = true;
                    self.advance();
                }
                '#' => {
                    while self.current_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                c if c.is_whitespace() => self.advance(),
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_escape(&mut self, result: &mut String) -> Result<(), LexError> {
        let position = self.position;
        self.advance(); // Consume backslash
        match self.current_char() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\\') => result.push('\\'),
            Some('\n') => {} // line continuation
            Some(ch) => return Err(LexError::InvalidEscape { ch, position }),
            None => return Err(LexError::UnterminatedString { position }),
        }
        self.advance();
        Ok(())
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\n' => break,
                '\\' => self.read_escape(&mut result)?,
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_multiline_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance_by(3);

        while let Some(ch) = self.current_char() {
            if ch == quote && self.peek_char(1) == Some(quote) && self.peek_char(2) == Some(quote) {
                self.advance_by(3);
                return Ok(result);
            } else if ch == '\\' {
                self.read_escape(&mut result)?;
            } else {
                result.push(ch);
                self.advance();
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_digits(&mut self, number: &mut String) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        self.read_digits(&mut number);

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number.push('e');
                self.advance();
                if signed {
                    number.push(self.current_char().unwrap_or('+'));
                    self.advance();
                }
                self.read_digits(&mut number);
            }
        }

        let invalid = |text: String| LexError::InvalidNumber {
            text,
            position: start,
        };
        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| invalid(number))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| invalid(number))
        }
    }

    /// Consume `width` characters and produce `token`.
    fn symbol(&mut self, width: usize, token: Token) -> Result<Token, LexError> {
        self.advance_by(width);
        Ok(token)
    }

    fn read_token(&mut self) -> Result<Token, LexError> {
        let position = self.position;
        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };
        let next = self.peek_char(1);

        match ch {
            '+' => self.symbol(1, Token::Plus),
            '-' if next == Some('>') => self.symbol(2, Token::RightArrow),
            '-' => self.symbol(1, Token::Minus),
            '*' if next == Some('*') => self.symbol(2, Token::Power),
            '*' => self.symbol(1, Token::Star),
            '/' => self.symbol(1, Token::Slash),
            '%' => self.symbol(1, Token::Percent),
            '=' if next == Some('=') => self.symbol(2, Token::EqEq),
            '!' if next == Some('=') => self.symbol(2, Token::NotEq),
            '<' if next == Some('=') => self.symbol(2, Token::LtEq),
            '<' if next == Some('-') => self.symbol(2, Token::LeftArrow),
            '<' => self.symbol(1, Token::Lt),
            '>' if next == Some('=') => self.symbol(2, Token::GtEq),
            '>' => self.symbol(1, Token::Gt),
            ':' if next == Some('=') => self.symbol(2, Token::ColonEqual),
            ':' => self.symbol(1, Token::Colon),
            ';' => self.symbol(1, Token::Semicolon),
            ',' => self.symbol(1, Token::Comma),
            '(' => self.symbol(1, Token::LParen),
            ')' => self.symbol(1, Token::RParen),
            '[' => self.symbol(1, Token::LBracket),
            ']' => self.symbol(1, Token::RBracket),
            '{' => self.symbol(1, Token::LBrace),
            '}' => self.symbol(1, Token::RBrace),
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            '.' => self.symbol(1, Token::Dot),
            '\'' | '"' => {
                if next == Some(ch) && self.peek_char(2) == Some(ch) {
                    self.read_multiline_string(ch).map(Token::String)
                } else {
                    self.read_string(ch).map(Token::String)
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                Ok(Token::keyword(&ident).unwrap_or(Token::Identifier(ident)))
            }
            c if c.is_ascii_digit() => self.read_number(),
            c => Err(LexError::UnexpectedChar { ch: c, position }),
        }
    }

    /// Produce the next token with its span.
    pub fn next_token(&mut self) -> Result<Lexeme, LexError> {
        self.skip_whitespace_and_comments();
        let newline_before = std::mem::take(&mut self.newline_pending);
        let start = self.position;
        let token = self.read_token()?;
        Ok(Lexeme {
            token,
            span: self.span_from(start),
            newline_before,
        })
    }

    /// Tokenize the whole input; the last lexeme is always [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme>, LexError> {
        let mut lexemes = Vec::new();
        loop {
            let lexeme = self.next_token()?;
            let done = lexeme.token == Token::Eof;
            lexemes.push(lexeme);
            if done {
                return Ok(lexemes);
            }
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not count weight by");
    assert_eq!(lexer.next_token().unwrap().token, Token::And);
    assert_eq!(lexer.next_token().unwrap().token, Token::Or);
    assert_eq!(lexer.next_token().unwrap().token, Token::Not);
    assert_eq!(lexer.next_token().unwrap().token, Token::Count);
    assert_eq!(lexer.next_token().unwrap().token, Token::Weight);
    assert_eq!(lexer.next_token().unwrap().token, Token::By);
}

#[test]
fn test_axis() {
    let mut lexer = Lexer::new("by regular(2, 0.0, 4.0) <- x");
    let tokens: Vec<Token> = lexer
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token::By,
            Token::Identifier("regular".to_string()),
            Token::LParen,
            Token::Integer(2),
            Token::Comma,
            Token::Float(0.0),
            Token::Comma,
            Token::Float(4.0),
            Token::RParen,
            Token::LeftArrow,
            Token::Identifier("x".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_newline_flag() {
    let mut lexer = Lexer::new("a # comment\n  b c");
    assert!(!lexer.next_token().unwrap().newline_before);
    let b = lexer.next_token().unwrap();
    assert!(b.newline_before);
    assert_eq!((b.span.line, b.span.column), (2, 2));
    assert!(!lexer.next_token().unwrap().newline_before);
}
