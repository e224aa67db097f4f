/// Special operator tags.
///
/// Every operator in ADL parses into a call whose callee is one of these
/// tags. Method-like names (`.map`, `.phi`, `.delta_r`) are not tags of
/// their own: they are resolved by the [`Special::Attribute`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    /// Attribute access (`x.name`)
    Attribute,
    /// Subscript (`x[i]`)
    Subscript,

    // Logical
    /// Logical OR (`or`)
    Or,
    /// Logical AND (`and`)
    And,
    /// Logical NOT (`not`)
    Not,

    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Less than (`<`)
    Less,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Greater than (`>`)
    Greater,

    // Arithmetic
    /// Addition (`+`)
    Plus,
    /// Subtraction (`-`)
    Minus,
    /// Multiplication (`*`)
    Times,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
    /// Unary plus (`+x`)
    UnaryPlus,
    /// Unary minus (`-x`)
    UnaryMinus,
    /// Exponentiation (`**`)
    Power,
}

impl Special {
    /// Number of operands the tag is applied to.
    pub fn arity(self) -> usize {
        match self {
            Special::Not | Special::UnaryPlus | Special::UnaryMinus => 1,
            _ => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Special::Attribute => ".",
            Special::Subscript => "[]",
            Special::Or => "or",
            Special::And => "and",
            Special::Not => "not",
            Special::Equal => "==",
            Special::NotEqual => "!=",
            Special::LessEqual => "<=",
            Special::Less => "<",
            Special::GreaterEqual => ">=",
            Special::Greater => ">",
            Special::Plus => "+",
            Special::Minus => "-",
            Special::Times => "*",
            Special::Divide => "/",
            Special::Modulo => "%",
            Special::UnaryPlus => "unary +",
            Special::UnaryMinus => "unary -",
            Special::Power => "**",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Special::Equal
                | Special::NotEqual
                | Special::LessEqual
                | Special::Less
                | Special::GreaterEqual
                | Special::Greater
        )
    }
}
