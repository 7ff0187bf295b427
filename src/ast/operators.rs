use std::fmt;

/// Prefix and postfix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`)
    Negate,
    /// Unary plus (`+`), a no-op
    Plus,
    /// Bitwise complement (`~`)
    BitNot,
    /// Logical negation (`NOT`)
    Not,
    /// Postfix `ISNULL`
    IsNull,
    /// Postfix `NOTNULL` / `NOT NULL`
    NotNull,
}

/// Binary operators, carrying their SQL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Concatenation
    /// `||`
    Concat,

    // Arithmetic
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `+`
    Add,
    /// `-`
    Subtract,

    // Bitwise
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,

    // Relational
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,

    // Comparison tier
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `<>`
    LessGreater,
    /// `IS`
    Is,
    /// `IS NOT`
    IsNot,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `REGEXP`
    Regexp,
    /// `NOT REGEXP`
    NotRegexp,
    /// `IN` with a non-list right operand (`a IN 4`)
    In,
    /// `NOT IN` with a non-list right operand
    NotIn,

    // Logical
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Concat => "||",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::ShiftLeft => "<<",
            BinOp::ShiftRight => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::Equal => "=",
            BinOp::EqualEqual => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessGreater => "<>",
            BinOp::Is => "IS",
            BinOp::IsNot => "IS NOT",
            BinOp::Like => "LIKE",
            BinOp::NotLike => "NOT LIKE",
            BinOp::Regexp => "REGEXP",
            BinOp::NotRegexp => "NOT REGEXP",
            BinOp::In => "IN",
            BinOp::NotIn => "NOT IN",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
