use std::fmt;

/// Reserved words of the query language.
///
/// Keywords are matched case-insensitively and can never be used as bare
/// identifiers (quote them with `"..."` instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    All,
    And,
    As,
    Asc,
    Between,
    By,
    CurrentDate,
    CurrentTime,
    CurrentTimestamp,
    Desc,
    Distinct,
    Else,
    Except,
    Exists,
    False,
    From,
    Group,
    Having,
    In,
    Intersect,
    Is,
    IsNull,
    Like,
    Limit,
    Not,
    NotNull,
    Null,
    Offset,
    On,
    Or,
    Order,
    Regexp,
    Select,
    True,
    Union,
    Where,
}

impl Keyword {
    /// Look up a keyword by its (case-insensitive) spelling.
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "ALL" => Keyword::All,
            "AND" => Keyword::And,
            "AS" => Keyword::As,
            "ASC" => Keyword::Asc,
            "BETWEEN" => Keyword::Between,
            "BY" => Keyword::By,
            "CURRENT_DATE" => Keyword::CurrentDate,
            "CURRENT_TIME" => Keyword::CurrentTime,
            "CURRENT_TIMESTAMP" => Keyword::CurrentTimestamp,
            "DESC" => Keyword::Desc,
            "DISTINCT" => Keyword::Distinct,
            "ELSE" => Keyword::Else,
            "EXCEPT" => Keyword::Except,
            "EXISTS" => Keyword::Exists,
            "FALSE" => Keyword::False,
            "FROM" => Keyword::From,
            "GROUP" => Keyword::Group,
            "HAVING" => Keyword::Having,
            "IN" => Keyword::In,
            "INTERSECT" => Keyword::Intersect,
            "IS" => Keyword::Is,
            "ISNULL" => Keyword::IsNull,
            "LIKE" => Keyword::Like,
            "LIMIT" => Keyword::Limit,
            "NOT" => Keyword::Not,
            "NOTNULL" => Keyword::NotNull,
            "NULL" => Keyword::Null,
            "OFFSET" => Keyword::Offset,
            "ON" => Keyword::On,
            "OR" => Keyword::Or,
            "ORDER" => Keyword::Order,
            "REGEXP" => Keyword::Regexp,
            "SELECT" => Keyword::Select,
            "TRUE" => Keyword::True,
            "UNION" => Keyword::Union,
            "WHERE" => Keyword::Where,
            _ => return None,
        };
        Some(keyword)
    }

    /// Canonical (upper case) spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::All => "ALL",
            Keyword::And => "AND",
            Keyword::As => "AS",
            Keyword::Asc => "ASC",
            Keyword::Between => "BETWEEN",
            Keyword::By => "BY",
            Keyword::CurrentDate => "CURRENT_DATE",
            Keyword::CurrentTime => "CURRENT_TIME",
            Keyword::CurrentTimestamp => "CURRENT_TIMESTAMP",
            Keyword::Desc => "DESC",
            Keyword::Distinct => "DISTINCT",
            Keyword::Else => "ELSE",
            Keyword::Except => "EXCEPT",
            Keyword::Exists => "EXISTS",
            Keyword::False => "FALSE",
            Keyword::From => "FROM",
            Keyword::Group => "GROUP",
            Keyword::Having => "HAVING",
            Keyword::In => "IN",
            Keyword::Intersect => "INTERSECT",
            Keyword::Is => "IS",
            Keyword::IsNull => "ISNULL",
            Keyword::Like => "LIKE",
            Keyword::Limit => "LIMIT",
            Keyword::Not => "NOT",
            Keyword::NotNull => "NOTNULL",
            Keyword::Null => "NULL",
            Keyword::Offset => "OFFSET",
            Keyword::On => "ON",
            Keyword::Or => "OR",
            Keyword::Order => "ORDER",
            Keyword::Regexp => "REGEXP",
            Keyword::Select => "SELECT",
            Keyword::True => "TRUE",
            Keyword::Union => "UNION",
            Keyword::Where => "WHERE",
        }
    }
}

/// Bind parameter marker.
///
/// Parameters are parsed and compiled into interpreter variables but never
/// evaluated by the compiler itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// `?` (auto-numbered) or `?NNN`
    Positional(Option<u32>),
    /// `:name`, `@name` or `$name`
    Named { prefix: char, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 01
    /// ```
    Integer(i64),

    /// Real literal, kept exactly as written
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 10E9
    /// .5
    /// ```
    Real(rust_decimal::Decimal),

    /// Real literal too large or too precise for a decimal
    ///
    /// # Examples
    /// ```text
    /// 1e30
    /// 1.5e-40
    /// ```
    Float(f64),

    /// String literal enclosed in single quotes (`''` escapes a quote)
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'is ''scary'''
    /// ```
    String(String),

    /// Hex blob literal; holds the hex digits only
    ///
    /// # Examples
    /// ```text
    /// x'C0FFEE'
    /// ```
    Blob(String),

    /// Bind parameter
    Parameter(Parameter),

    // Identifiers
    /// Bare identifier, already folded to lower case
    ///
    /// # Examples
    /// ```text
    /// sourcefile
    /// image_height
    /// ```
    Identifier(String),

    /// Double-quoted identifier, case preserved (`""` escapes a quote)
    ///
    /// # Examples
    /// ```text
    /// "SourceFile"
    /// "File:ImageHeight"
    /// ```
    QuotedIdentifier(String),

    /// Reserved word
    Keyword(Keyword),

    // Negated operators. `NOT` directly in front of these keywords is fused
    // into one token so it binds to the operator, not to the whole comparison.
    /// `NOT NULL` (postfix null test)
    NotNullOp,
    /// `NOT BETWEEN`
    NotBetween,
    /// `NOT IN`
    NotIn,
    /// `NOT LIKE`
    NotLike,
    /// `NOT REGEXP`
    NotRegexp,

    // Operators
    /// `||` string concatenation
    Concat,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `~`
    Tilde,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<>`
    LtGt,

    // Delimiters
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Comma
    Comma,
    /// Dot, separates qualifiers from column names
    Dot,
    /// Statement terminator
    Semicolon,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Real(d) => write!(f, "{}", d),
            Token::Float(x) => write!(f, "{:e}", x),
            Token::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Blob(hex) => write!(f, "x'{}'", hex),
            Token::Parameter(Parameter::Positional(None)) => write!(f, "?"),
            Token::Parameter(Parameter::Positional(Some(n))) => write!(f, "?{}", n),
            Token::Parameter(Parameter::Named { prefix, name }) => write!(f, "{}{}", prefix, name),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::QuotedIdentifier(name) => write!(f, "\"{}\"", name.replace('"', "\"\"")),
            Token::Keyword(k) => write!(f, "{}", k.as_str()),
            Token::NotNullOp => write!(f, "NOT NULL"),
            Token::NotBetween => write!(f, "NOT BETWEEN"),
            Token::NotIn => write!(f, "NOT IN"),
            Token::NotLike => write!(f, "NOT LIKE"),
            Token::NotRegexp => write!(f, "NOT REGEXP"),
            Token::Concat => write!(f, "||"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::ShiftLeft => write!(f, "<<"),
            Token::ShiftRight => write!(f, ">>"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Tilde => write!(f, "~"),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Eq => write!(f, "="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::LtGt => write!(f, "<>"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Semicolon => write!(f, ";"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
