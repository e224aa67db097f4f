use crate::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// .5
    /// 1e-3
    /// ```
    Float(f64),

    /// Decimal integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0
    /// ```
    Integer(i64),

    /// String literal, single- or multi-line
    ///
    /// # Examples
    /// ```text
    /// 'muons'
    /// "jets"
    /// '''a description
    /// spanning lines'''
    /// ```
    String(String),

    /// Variable or function name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    Identifier(String),

    // Reserved words
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,
    /// Logical NOT (`not`), also introduces `not source`
    Not,

    /// `count` collector
    Count,
    /// `sum` collector
    Sum,
    /// `profile` collector
    Profile,
    /// `fraction` collector
    Fraction,

    /// `source` block, filtered on the record's provenance tag
    ///
    /// # Examples
    /// ```text
    /// source 'data*' { count 'events' }
    /// ```
    Source,

    /// `region` block
    Region,

    /// `vary` block of systematic variations
    Vary,

    /// `by`, introducing binning axes
    ///
    /// # Examples
    /// ```text
    /// count 'pt' by regular(10, 0, 100) <- pt
    /// ```
    By,

    /// `weight`, introducing a collector's weight expression
    Weight,

    /// `for` loop
    For,

    /// `in`, separating a loop variable from its iterable
    In,

    // Arithmetic
    /// Addition (`+`)
    Plus,
    /// Subtraction or negation (`-`)
    Minus,
    /// Multiplication (`*`)
    Star,
    /// Division (`/`), always floating-point
    Slash,
    /// Modulo (`%`)
    Percent,
    /// Exponentiation (`**`)
    Power,

    // Comparison
    /// Equality operator
    EqEq,
    /// Inequality operator
    NotEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,

    // Structure
    /// Assignment / definition (`:=`)
    ColonEqual,

    /// Axis binding (`<-`)
    ///
    /// # Examples
    /// ```text
    /// regular(2, 0.0, 4.0) <- x
    /// ```
    LeftArrow,

    /// Inline function (`->`)
    ///
    /// # Examples
    /// ```text
    /// jets.map(j -> j.pt)
    /// ```
    RightArrow,

    /// Attribute access
    Dot,
    /// Argument and pattern separator
    Comma,
    /// Statement separator
    Semicolon,
    /// Optional terminator of a variation label
    Colon,

    /// Left parenthesis for grouping, calls and parameter lists
    LParen,
    /// Right parenthesis
    RParen,
    /// Left bracket for subscripts
    LBracket,
    /// Right bracket
    RBracket,
    /// Left brace opening a block or function body
    LBrace,
    /// Right brace
    RBrace,

    /// End of input
    Eof,
}

impl Token {
    /// Map a reserved word to its token.
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "count" => Token::Count,
            "sum" => Token::Sum,
            "profile" => Token::Profile,
            "fraction" => Token::Fraction,
            "source" => Token::Source,
            "region" => Token::Region,
            "vary" => Token::Vary,
            "by" => Token::By,
            "weight" => Token::Weight,
            "for" => Token::For,
            "in" => Token::In,
            _ => return None,
        };
        Some(token)
    }

    /// Short human-readable description, used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Float(n) => format!("number {}", n),
            Token::Integer(n) => format!("number {}", n),
            Token::String(s) => format!("string {:?}", s),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::Count => "count",
            Token::Sum => "sum",
            Token::Profile => "profile",
            Token::Fraction => "fraction",
            Token::Source => "source",
            Token::Region => "region",
            Token::Vary => "vary",
            Token::By => "by",
            Token::Weight => "weight",
            Token::For => "for",
            Token::In => "in",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Power => "**",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::ColonEqual => ":=",
            Token::LeftArrow => "<-",
            Token::RightArrow => "->",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Float(_)
            | Token::Integer(_)
            | Token::String(_)
            | Token::Identifier(_)
            | Token::Eof => "",
        }
    }
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Span,
    /// True when at least one newline separates this token from the previous one.
    pub newline_before: bool,
}
