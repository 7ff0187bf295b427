//! Lowering of expression trees into `jq` filter fragments.
//!
//! Every fragment is evaluated against a single record, which `jq` calls `.`.
//! Compound fragments are always parenthesized, so they can be embedded
//! anywhere without relying on `jq`'s own operator precedence.
//!
//! ```text
//! "File:ImageHeight" > 2315        =>  (.["File:ImageHeight"] > 2315)
//! "File:FileType" LIKE 'j%g'       =>  ((.["File:FileType"]) as $__mql_v1 | if ... test("^j.*?g$"; "i") ...)
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crate::{
    ast::{BinOp, Expr, FunctionArgs, Literal, Parameter, Token, UnaryOp},
    lexer::Position,
    parser::ParseError,
};

/// Regex flags passed to `test/2` for LIKE and REGEXP.
const MATCH_FLAGS: &str = "i";

/// Prefix of the variables the compiler binds internally.
const BINDING_PREFIX: &str = "__mql_v";

/// Errors raised while turning query text into a filter program.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The text is not a valid SELECT statement
    Syntax(ParseError),

    /// A construct the grammar accepts but the compiler cannot express
    Unsupported { construct: String, position: Position },

    /// ORDER BY names something that is not an output column
    UnknownOrderTerm { term: String, position: Position },

    /// Positional ORDER BY outside `1..=columns`
    OrderIndexOutOfRange {
        index: i64,
        columns: usize,
        position: Position,
    },

    /// ORDER BY terms disagree on ASC/DESC
    MixedSortDirections { position: Position },

    /// LIMIT or OFFSET is not an integer literal
    InvalidLimit { fragment: String, position: Position },
}

impl CompileError {
    pub fn unsupported(construct: impl Into<String>, position: Position) -> Self {
        CompileError::Unsupported {
            construct: construct.into(),
            position,
        }
    }

    /// Where in the query text the problem was found.
    pub fn position(&self) -> Position {
        match self {
            CompileError::Syntax(e) => e.position,
            CompileError::Unsupported { position, .. }
            | CompileError::UnknownOrderTerm { position, .. }
            | CompileError::OrderIndexOutOfRange { position, .. }
            | CompileError::MixedSortDirections { position }
            | CompileError::InvalidLimit { position, .. } => *position,
        }
    }

    /// The message without the position suffix.
    pub fn message(&self) -> String {
        match self {
            CompileError::Syntax(e) => e.message.clone(),
            CompileError::Unsupported { construct, .. } => format!("Unsupported: {}", construct),
            CompileError::UnknownOrderTerm { term, .. } => format!(
                "ORDER BY term '{}' does not match any output column alias",
                term
            ),
            CompileError::OrderIndexOutOfRange { index, columns, .. } => format!(
                "ORDER BY term {} is out of range - should be between 1 and {}",
                index, columns
            ),
            CompileError::MixedSortDirections { .. } => {
                "ORDER BY terms must all use the same direction (ASC or DESC)".to_string()
            }
            CompileError::InvalidLimit { fragment, .. } => {
                format!("LIMIT and OFFSET must be integer literals, found '{}'", fragment)
            }
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Syntax(e) => write!(f, "Syntax error: {}", e),
            other => write!(f, "{} at {}", other.message(), other.position()),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Syntax(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Syntax(e)
    }
}

/// `jq` function definitions some operators depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Helper {
    BitAnd,
    BitOr,
}

impl Helper {
    fn name(&self) -> &'static str {
        match self {
            Helper::BitAnd => "_mql_bitand",
            Helper::BitOr => "_mql_bitor",
        }
    }

    /// Definitions work on non-negative integers.
    fn definition(&self) -> &'static str {
        match self {
            Helper::BitAnd => {
                "def _mql_bitand($a; $b): if $a == 0 or $b == 0 then 0 \
                 else (($a % 2) * ($b % 2)) + 2 * _mql_bitand(($a / 2 | floor); ($b / 2 | floor)) end;"
            }
            Helper::BitOr => {
                "def _mql_bitor($a; $b): if $a == 0 then $b elif $b == 0 then $a \
                 else ((($a % 2) + ($b % 2) - ($a % 2) * ($b % 2))) \
                 + 2 * _mql_bitor(($a / 2 | floor); ($b / 2 | floor)) end;"
            }
        }
    }
}

/// Render a Rust string as a `jq` string literal.
///
/// JSON string escaping is valid `jq` syntax and never produces `\(`, so the
/// result cannot trigger string interpolation.
pub fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// `jq` lookup of a record field.
pub fn field_lookup(field: &str) -> String {
    format!(".[{}]", string_literal(field))
}

/// Translate a LIKE pattern into an anchored regular expression.
///
/// `%` matches any run of characters (lazily), `_` exactly one character;
/// everything else matches itself.
pub fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    let mut buffer = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*?"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut buffer))),
        }
    }
    regex.push('$');
    regex
}

/// Operators that map one-to-one onto a `jq` infix operator.
fn infix_symbol(op: BinOp) -> Option<&'static str> {
    Some(match op {
        BinOp::Multiply => "*",
        BinOp::Divide => "/",
        BinOp::Modulo => "%",
        BinOp::Add => "+",
        BinOp::Subtract => "-",
        BinOp::LessThan => "<",
        BinOp::LessEqual => "<=",
        BinOp::GreaterThan => ">",
        BinOp::GreaterEqual => ">=",
        BinOp::Equal | BinOp::EqualEqual | BinOp::Is => "==",
        BinOp::NotEqual | BinOp::LessGreater | BinOp::IsNot => "!=",
        BinOp::And => "and",
        BinOp::Or => "or",
        _ => return None,
    })
}

/// Short description of a node for error messages, with its position when
/// the node records one.
fn describe(expr: &Expr) -> (String, Position) {
    match expr {
        Expr::Column(column) => (format!("column '{}'", column.column), Position::default()),
        Expr::Parameter {
            parameter,
            position,
        } => (format!("bind parameter {}", Token::Parameter(parameter.clone())), *position),
        Expr::Function { name, position, .. } => (format!("call to {}()", name), *position),
        Expr::Exists { position, .. } => ("EXISTS subquery".to_string(), *position),
        Expr::Literal(_) => ("non-string literal".to_string(), Position::default()),
        _ => ("expression".to_string(), Position::default()),
    }
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Compiles expression nodes into `jq` fragments.
///
/// One compiler is used per query so internal variable names stay unique and
/// the referenced parameters and helpers can be collected.
#[derive(Debug, Default)]
pub struct ExprCompiler {
    next_binding: usize,
    next_positional: u32,
    parameters: Vec<String>,
    helpers: BTreeSet<Helper>,
}

impl ExprCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the bind parameters referenced so far, in order of first use.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Definitions of the helper functions referenced so far.
    pub fn prelude(&self) -> String {
        self.helpers
            .iter()
            .map(|h| format!("{} ", h.definition()))
            .collect()
    }

    fn binding(&mut self) -> String {
        self.next_binding += 1;
        format!("${}{}", BINDING_PREFIX, self.next_binding)
    }

    /// Compile an expression evaluated against the current record.
    pub fn compile(&mut self, expr: &Expr) -> Result<String, CompileError> {
        match expr {
            Expr::Literal(literal) => Ok(Self::literal(literal)),

            Expr::Column(column) => Ok(field_lookup(&column.column)),

            Expr::Parameter {
                parameter,
                position,
            } => self.parameter(parameter, *position),

            Expr::Unary { op, operand } => {
                let operand = self.compile(operand)?;
                Ok(match op {
                    UnaryOp::Negate => format!("(-({}))", operand),
                    UnaryOp::Plus => operand,
                    UnaryOp::BitNot => format!("(-({}) - 1)", operand),
                    UnaryOp::Not => format!("({} | not)", operand),
                    UnaryOp::IsNull => format!("({} == null)", operand),
                    UnaryOp::NotNull => format!("({} != null)", operand),
                })
            }

            Expr::Binary { op, left, right } => self.binary(*op, left, right),

            Expr::Between {
                negated,
                value,
                low,
                high,
            } => {
                let value = self.compile(value)?;
                let low = self.compile(low)?;
                let high = self.compile(high)?;
                let var = self.binding();
                // NOT BETWEEN is spelled as the complementary pair of
                // comparisons; equivalent as long as no operand is null.
                if *negated {
                    Ok(format!(
                        "(({}) as {v} | ({v} < {} or {v} > {}))",
                        value,
                        low,
                        high,
                        v = var
                    ))
                } else {
                    Ok(format!(
                        "(({}) as {v} | ({v} >= {} and {v} <= {}))",
                        value,
                        low,
                        high,
                        v = var
                    ))
                }
            }

            Expr::InList {
                negated,
                value,
                list,
            } => self.membership(*negated, value, list),

            Expr::Function {
                name,
                args,
                position,
            } => self.function(name, args, *position),

            Expr::Exists { position, .. } => Err(CompileError::unsupported(
                "EXISTS subqueries",
                *position,
            )),
        }
    }

    fn literal(literal: &Literal) -> String {
        match literal {
            Literal::Integer(n) => n.to_string(),
            Literal::Real(d) => d.to_string(),
            Literal::Float(x) => format!("{:e}", x),
            Literal::String(s) => string_literal(s),
            Literal::Blob(hex) => string_literal(hex),
            Literal::Boolean(b) => b.to_string(),
            Literal::Null => "null".to_string(),
            Literal::CurrentTime => r#"(now | strftime("%H:%M:%S"))"#.to_string(),
            Literal::CurrentDate => r#"(now | strftime("%Y-%m-%d"))"#.to_string(),
            Literal::CurrentTimestamp => r#"(now | strftime("%Y-%m-%d %H:%M:%S"))"#.to_string(),
        }
    }

    fn parameter(
        &mut self,
        parameter: &Parameter,
        position: Position,
    ) -> Result<String, CompileError> {
        let name = match parameter {
            Parameter::Positional(None) => {
                self.next_positional += 1;
                format!("p{}", self.next_positional)
            }
            Parameter::Positional(Some(n)) => {
                self.next_positional = self.next_positional.max(*n);
                format!("p{}", n)
            }
            Parameter::Named { prefix, name } => {
                if !is_variable_name(name) || name.starts_with(BINDING_PREFIX) {
                    return Err(CompileError::unsupported(
                        format!("parameter name '{}{}'", prefix, name),
                        position,
                    ));
                }
                name.clone()
            }
        };

        if !self.parameters.contains(&name) {
            self.parameters.push(name.clone());
        }
        Ok(format!("${}", name))
    }

    fn binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<String, CompileError> {
        match op {
            BinOp::Like | BinOp::NotLike => {
                let pattern = match right {
                    Expr::Literal(Literal::String(pattern)) => like_to_regex(pattern),
                    other => {
                        let (fragment, position) = describe(other);
                        return Err(CompileError::unsupported(
                            format!("LIKE pattern {} (expected a string literal)", fragment),
                            position,
                        ));
                    }
                };
                let value = self.compile(left)?;
                Ok(self.pattern_test(value, string_literal(&pattern), op == BinOp::NotLike))
            }

            BinOp::Regexp | BinOp::NotRegexp => {
                let value = self.compile(left)?;
                let negated = op == BinOp::NotRegexp;
                match right {
                    Expr::Literal(Literal::String(pattern)) => {
                        Ok(self.pattern_test(value, string_literal(pattern), negated))
                    }
                    dynamic => {
                        // The pattern has to be evaluated against the record
                        // before the value is piped into test/2
                        let pattern = self.compile(dynamic)?;
                        let var = self.binding();
                        let test = self.pattern_test(value, var.clone(), negated);
                        Ok(format!("(({}) as {} | {})", pattern, var, test))
                    }
                }
            }

            BinOp::In | BinOp::NotIn => {
                self.membership(op == BinOp::NotIn, left, std::slice::from_ref(right))
            }

            BinOp::Concat => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(format!(
                    "([{}, {}] | if any(.[]; . == null) then null else map(tostring) | add end)",
                    left, right
                ))
            }

            BinOp::ShiftLeft => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(format!("({} * pow(2; {}))", left, right))
            }

            BinOp::ShiftRight => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(format!("(({} / pow(2; {})) | floor)", left, right))
            }

            BinOp::BitAnd | BinOp::BitOr => {
                let helper = if op == BinOp::BitAnd {
                    Helper::BitAnd
                } else {
                    Helper::BitOr
                };
                self.helpers.insert(helper);
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(format!("{}({}; {})", helper.name(), left, right))
            }

            _ => {
                let symbol = infix_symbol(op).ok_or_else(|| {
                    CompileError::unsupported(format!("operator {}", op), Position::default())
                })?;
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(format!("({} {} {})", left, symbol, right))
            }
        }
    }

    /// Case-insensitive regex match; a null value never matches, negated or not.
    fn pattern_test(&mut self, value: String, pattern: String, negated: bool) -> String {
        let var = self.binding();
        let negation = if negated { " | not" } else { "" };
        format!(
            "(({}) as {v} | if {v} == null then false else ({v} | tostring | test({}; {}){}) end)",
            value,
            pattern,
            string_literal(MATCH_FLAGS),
            negation,
            v = var
        )
    }

    /// `value [NOT] IN (list)`; list elements are evaluated against the record.
    fn membership(
        &mut self,
        negated: bool,
        value: &Expr,
        list: &[Expr],
    ) -> Result<String, CompileError> {
        let value = self.compile(value)?;
        let items = list
            .iter()
            .map(|item| self.compile(item))
            .collect::<Result<Vec<_>, _>>()?;
        let var = self.binding();
        let negation = if negated { " | not" } else { "" };
        Ok(format!(
            "(({}) as {v} | any({}; . == {v}){})",
            value,
            items.join(", "),
            negation,
            v = var
        ))
    }

    fn function(
        &mut self,
        name: &str,
        args: &FunctionArgs,
        position: Position,
    ) -> Result<String, CompileError> {
        let args = match args {
            FunctionArgs::Star => {
                return Err(CompileError::unsupported(
                    format!("aggregate call {}(*)", name),
                    position,
                ));
            }
            FunctionArgs::List(args) => args,
        };

        let lower = name.to_ascii_lowercase();
        let (arity, body): (std::ops::RangeInclusive<usize>, fn(&[String]) -> String) =
            match lower.as_str() {
                "lower" => (1..=1, |a| {
                    format!("{} | if . == null then null else tostring | ascii_downcase end", a[0])
                }),
                "upper" => (1..=1, |a| {
                    format!("{} | if . == null then null else tostring | ascii_upcase end", a[0])
                }),
                "length" => (1..=1, |a| {
                    format!("{} | if . == null then null else tostring | length end", a[0])
                }),
                "abs" => (1..=1, |a| {
                    format!("{} | if . == null then null elif . < 0 then -. else . end", a[0])
                }),
                "round" => (1..=2, |a| match a.get(1) {
                    None => format!("{} | if . == null then null else round end", a[0]),
                    Some(digits) => format!(
                        "{} | if . == null then null else (. * pow(10; {d}) | round) / pow(10; {d}) end",
                        a[0],
                        d = digits
                    ),
                }),
                "trim" => (1..=1, |a| {
                    format!(
                        r#"{} | if . == null then null else tostring | sub("^\\s+"; "") | sub("\\s+$"; "") end"#,
                        a[0]
                    )
                }),
                "ltrim" => (1..=1, |a| {
                    format!(
                        r#"{} | if . == null then null else tostring | sub("^\\s+"; "") end"#,
                        a[0]
                    )
                }),
                "rtrim" => (1..=1, |a| {
                    format!(
                        r#"{} | if . == null then null else tostring | sub("\\s+$"; "") end"#,
                        a[0]
                    )
                }),
                "coalesce" => (2..=usize::MAX, |a| {
                    format!("[({}) | select(. != null)] | .[0]", a.join(", "))
                }),
                "ifnull" => (2..=2, |a| {
                    format!("[({}, {}) | select(. != null)] | .[0]", a[0], a[1])
                }),
                "nullif" => (2..=2, |a| {
                    format!("if {a} == {b} then null else {a} end", a = a[0], b = a[1])
                }),
                "substr" => (2..=3, |a| match a.get(2) {
                    None => format!(
                        "{} | if . == null then null else tostring | .[({} - 1):] end",
                        a[0], a[1]
                    ),
                    Some(len) => format!(
                        "{} | if . == null then null else tostring | .[({s} - 1):({s} - 1 + {l})] end",
                        a[0],
                        s = a[1],
                        l = len
                    ),
                }),
                "typeof" => (1..=1, |a| {
                    format!(
                        r#"{} | if . == null then "null" elif type == "number" then (if . == floor then "integer" else "real" end) elif type == "string" then "text" else type end"#,
                        a[0]
                    )
                }),
                "instr" => (2..=2, |a| {
                    format!(
                        "if {a} == null or {b} == null then null else ({a} | tostring | index({b} | tostring)) as $__mql_i | if $__mql_i == null then 0 else $__mql_i + 1 end end",
                        a = a[0],
                        b = a[1]
                    )
                }),
                _ => {
                    return Err(CompileError::unsupported(
                        format!("function '{}'", name),
                        position,
                    ));
                }
            };

        if !arity.contains(&args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else if *arity.end() == usize::MAX {
                format!("at least {}", arity.start())
            } else {
                format!("{} to {}", arity.start(), arity.end())
            };
            return Err(CompileError::unsupported(
                format!(
                    "{}() with {} argument(s), expected {}",
                    lower,
                    args.len(),
                    expected
                ),
                position,
            ));
        }

        // Arguments are evaluated against the record and bound first, so the
        // body can freely change `.`
        let mut bindings = String::new();
        let mut vars = Vec::with_capacity(args.len());
        for arg in args {
            let compiled = self.compile(arg)?;
            let var = self.binding();
            bindings.push_str(&format!("({}) as {} | ", compiled, var));
            vars.push(var);
        }

        Ok(format!("({}{})", bindings, body(&vars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_to_regex() {
        assert_eq!(like_to_regex("%lo"), "^.*?lo$");
        assert_eq!(like_to_regex("He%o"), "^He.*?o$");
        assert_eq!(like_to_regex("He__o"), "^He..o$");
        assert_eq!(like_to_regex("a.b"), r"^a\.b$");
    }

    #[test]
    fn test_field_lookup_escapes() {
        assert_eq!(field_lookup("File:FileType"), r#".["File:FileType"]"#);
        assert_eq!(field_lookup(r#"a"b"#), r#".["a\"b"]"#);
    }

    #[test]
    fn test_like_pattern_error_names_the_operand() {
        let position = Position {
            offset: 9,
            line: 1,
            column: 10,
        };
        let expr = Expr::binary(
            BinOp::Like,
            Expr::Column(crate::ast::ColumnRef::new("a")),
            Expr::Parameter {
                parameter: Parameter::Named {
                    prefix: ':',
                    name: "pat".into(),
                },
                position,
            },
        );
        let err = ExprCompiler::new().compile(&expr).unwrap_err();
        assert_eq!(err.position(), position);
        assert!(err.to_string().contains("bind parameter :pat"), "{}", err);
    }

    #[test]
    fn test_variable_names() {
        assert!(is_variable_name("min_height"));
        assert!(!is_variable_name("with space"));
        assert!(!is_variable_name("1abc"));
    }
}
