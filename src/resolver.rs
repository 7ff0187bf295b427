//! Interpretation of the SELECT list.

use crate::{
    ast::{ColumnRef, Expr, Literal, ResultColumn},
    compiler::CompileError,
};

/// One output column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Record key for plain column references, source text for computed columns
    pub field: String,
    /// Key of the column in every output row
    pub alias: String,
    pub expr: Expr,
}

impl Column {
    /// True when the column reads a record field unchanged.
    pub fn is_field(&self) -> bool {
        matches!(self.expr, Expr::Column(_))
    }
}

/// What the SELECT list produces for each record.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`: records pass through unchanged
    All,
    Columns(Vec<Column>),
}

impl Projection {
    /// Output aliases in SELECT-list order, duplicates removed.
    pub fn aliases(&self) -> Option<Vec<String>> {
        match self {
            Projection::All => None,
            Projection::Columns(columns) => {
                let mut aliases: Vec<String> = Vec::with_capacity(columns.len());
                for column in columns {
                    if !aliases.contains(&column.alias) {
                        aliases.push(column.alias.clone());
                    }
                }
                Some(aliases)
            }
        }
    }
}

/// Resolve the parsed SELECT list.
///
/// A bare `*` must stand alone; `table.*` is rejected.
pub fn resolve_columns(columns: &[ResultColumn]) -> Result<Projection, CompileError> {
    if let [ResultColumn::Star { .. }] = columns {
        return Ok(Projection::All);
    }

    let mut resolved = Vec::with_capacity(columns.len());
    for column in columns {
        match column {
            ResultColumn::Star { position } => {
                return Err(CompileError::unsupported(
                    "'*' combined with other result columns",
                    *position,
                ));
            }
            ResultColumn::QualifiedStar { table, position } => {
                return Err(CompileError::unsupported(
                    format!("qualified star '{}.*'", table),
                    *position,
                ));
            }
            ResultColumn::Expr {
                expr, alias, text, ..
            } => resolved.push(resolve_expr(expr, alias.as_deref(), text)),
        }
    }

    Ok(Projection::Columns(resolved))
}

fn resolve_expr(expr: &Expr, alias: Option<&str>, text: &str) -> Column {
    let (field, expr) = match expr {
        Expr::Column(column) => (column.column.clone(), expr.clone()),
        // `select 'SourceFile'` names a field
        Expr::Literal(Literal::String(name)) => {
            (name.clone(), Expr::Column(ColumnRef::new(name.clone())))
        }
        _ => (text.to_string(), expr.clone()),
    };

    Column {
        alias: alias.map(str::to_string).unwrap_or_else(|| field.clone()),
        field,
        expr,
    }
}
