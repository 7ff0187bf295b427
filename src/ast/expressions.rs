use rust_decimal::Decimal;

use crate::ast::{BinOp, Parameter, SelectStatement, UnaryOp};
use crate::lexer::Position;

/// Literal value appearing in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Real literal, exact decimal
    Real(Decimal),
    /// Real literal outside decimal range
    Float(f64),
    /// String literal
    String(String),
    /// Blob literal (hex digits)
    Blob(String),
    /// `TRUE` / `FALSE`
    Boolean(bool),
    /// `NULL`
    Null,
    /// `CURRENT_TIME`
    CurrentTime,
    /// `CURRENT_DATE`
    CurrentDate,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
}

/// Reference to a record field, optionally qualified as `[[db.]table.]column`.
///
/// Only `column` takes part in record lookup; the qualifiers are kept so the
/// tree reflects what was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub database: Option<String>,
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        ColumnRef {
            database: None,
            table: None,
            column: column.into(),
        }
    }
}

/// Arguments of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgs {
    /// `f(*)`
    Star,
    /// `f(a, b, ...)`, possibly empty
    List(Vec<Expr>),
}

/// Expression node.
///
/// Every node kind the grammar can produce; the compiler matches on it
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),

    /// Column reference
    ///
    /// # Examples
    /// ```text
    /// height
    /// "File:ImageHeight"
    /// db.images."SourceFile"
    /// ```
    Column(ColumnRef),

    /// Bind parameter
    Parameter {
        parameter: Parameter,
        position: Position,
    },

    /// Prefix or postfix unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `value [NOT] BETWEEN low AND high`
    Between {
        negated: bool,
        value: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },

    /// `value [NOT] IN (a, b, ...)`
    InList {
        negated: bool,
        value: Box<Expr>,
        list: Vec<Expr>,
    },

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// lower("File:FileType")
    /// count(*)
    /// ```
    Function {
        name: String,
        args: FunctionArgs,
        position: Position,
    },

    /// `EXISTS (select ...)`
    Exists {
        subquery: Box<SelectStatement>,
        position: Position,
    },
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}
