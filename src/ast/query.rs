use crate::ast::Expr;
use crate::lexer::Position;

/// `DISTINCT` / `ALL` following `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOption {
    Distinct,
    All,
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultColumn {
    /// `*`
    Star { position: Position },

    /// `table.*`
    QualifiedStar { table: String, position: Position },

    /// `expr [[AS] alias]`
    Expr {
        expr: Expr,
        alias: Option<String>,
        /// Canonical text of `expr`'s tokens, used as its default alias
        text: String,
        position: Position,
    },
}

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// `expr [ASC | DESC]`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingTerm {
    pub expr: Expr,
    /// `None` when no direction was written (ascending)
    pub direction: Option<Direction>,
    pub position: Position,
}

impl OrderingTerm {
    pub fn direction(&self) -> Direction {
        self.direction.unwrap_or(Direction::Asc)
    }
}

/// LIMIT clause, normalized to count + offset.
///
/// `LIMIT n OFFSET m` and `LIMIT m, n` both produce `count: n, offset: Some(m)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub count: Expr,
    pub offset: Option<Expr>,
    pub position: Position,
}

/// `FROM [db.]name [[AS] alias]`; parsed, never used for lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub database: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

/// A complete SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub option: Option<SelectOption>,
    pub columns: Vec<ResultColumn>,
    pub source: Option<Source>,
    pub where_clause: Option<Expr>,
    /// Accepted by the grammar, never compiled
    pub having: Option<Expr>,
    pub order_by: Vec<OrderingTerm>,
    pub limit: Option<Limit>,
}

impl SelectStatement {
    pub fn is_distinct(&self) -> bool {
        self.option == Some(SelectOption::Distinct)
    }
}
