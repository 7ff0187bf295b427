//! ORDER BY and LIMIT lowering.
//!
//! Sorting and slicing run after projection, so ORDER BY names refer to output
//! aliases rather than record fields. With `SELECT *` the rows are the records
//! themselves and names refer to record keys.

use crate::{
    ast::{Direction, Expr, Limit, Literal, OrderingTerm, UnaryOp},
    compiler::{field_lookup, CompileError},
    resolver::Projection,
};

/// Sort stage of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    /// Keys of the rows to sort by, most significant first
    pub keys: Vec<String>,
    pub direction: Direction,
}

impl Ordering {
    /// `sort_by(...)` followed by `reverse` for descending order.
    pub fn fragment(&self) -> String {
        let keys: Vec<String> = self.keys.iter().map(|k| field_lookup(k)).collect();
        match self.direction {
            Direction::Asc => format!("sort_by({})", keys.join(", ")),
            Direction::Desc => format!("sort_by({}) | reverse", keys.join(", ")),
        }
    }
}

/// Resolve ORDER BY terms against the projection.
///
/// Returns `None` when there is nothing to sort by.
pub fn compile_order(
    terms: &[OrderingTerm],
    projection: &Projection,
) -> Result<Option<Ordering>, CompileError> {
    let Some(first) = terms.first() else {
        return Ok(None);
    };

    let direction = first.direction();
    let mut keys = Vec::with_capacity(terms.len());

    for term in terms {
        if term.direction() != direction {
            return Err(CompileError::MixedSortDirections {
                position: term.position,
            });
        }
        keys.push(resolve_term(term, projection)?);
    }

    Ok(Some(Ordering { keys, direction }))
}

fn resolve_term(term: &OrderingTerm, projection: &Projection) -> Result<String, CompileError> {
    match (&term.expr, projection) {
        (Expr::Column(column), Projection::All) => Ok(column.column.clone()),

        (Expr::Column(column), Projection::Columns(columns)) => columns
            .iter()
            .find(|c| c.alias == column.column)
            .map(|c| c.alias.clone())
            .ok_or_else(|| CompileError::UnknownOrderTerm {
                term: column.column.clone(),
                position: term.position,
            }),

        (Expr::Literal(Literal::Integer(index)), Projection::All) => {
            Err(CompileError::unsupported(
                format!("positional ORDER BY term {} with 'SELECT *'", index),
                term.position,
            ))
        }

        (Expr::Literal(Literal::Integer(index)), Projection::Columns(columns)) => {
            let found = usize::try_from(*index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| columns.get(i));
            match found {
                Some(column) => Ok(column.alias.clone()),
                None => Err(CompileError::OrderIndexOutOfRange {
                    index: *index,
                    columns: columns.len(),
                    position: term.position,
                }),
            }
        }

        _ => Err(CompileError::unsupported(
            "ORDER BY terms other than output column names or positions",
            term.position,
        )),
    }
}

/// Compile LIMIT/OFFSET into an array slice such as `.[6:11]`.
///
/// A negative count removes the upper bound and a negative offset counts as
/// zero. Returns `None` when the slice would keep every row.
pub fn compile_limit(limit: Option<&Limit>) -> Result<Option<String>, CompileError> {
    let Some(limit) = limit else {
        return Ok(None);
    };

    let count = integer_operand(&limit.count, limit)?;
    let offset = match &limit.offset {
        Some(offset) => integer_operand(offset, limit)?.max(0),
        None => 0,
    };

    let slice = match (count, offset) {
        (count, 0) if count < 0 => None,
        (count, offset) if count < 0 => Some(format!(".[{}:]", offset)),
        (count, 0) => Some(format!(".[:{}]", count)),
        (count, offset) => Some(format!(".[{}:{}]", offset, offset.saturating_add(count))),
    };
    Ok(slice)
}

fn integer_operand(expr: &Expr, limit: &Limit) -> Result<i64, CompileError> {
    match expr {
        Expr::Literal(Literal::Integer(n)) => Ok(*n),
        Expr::Unary {
            op: UnaryOp::Negate,
            operand,
        } => match operand.as_ref() {
            Expr::Literal(Literal::Integer(n)) => Ok(-n),
            other => Err(invalid_limit(other, limit)),
        },
        Expr::Unary {
            op: UnaryOp::Plus,
            operand,
        } => integer_operand(operand, limit),
        other => Err(invalid_limit(other, limit)),
    }
}

fn invalid_limit(expr: &Expr, limit: &Limit) -> CompileError {
    let fragment = match expr {
        Expr::Literal(Literal::Real(d)) => d.to_string(),
        Expr::Literal(Literal::Float(x)) => format!("{:e}", x),
        Expr::Literal(Literal::String(s)) => format!("'{}'", s),
        Expr::Column(column) => column.column.clone(),
        Expr::Parameter { .. } => "bind parameter".to_string(),
        _ => "expression".to_string(),
    };
    CompileError::InvalidLimit {
        fragment,
        position: limit.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Position;

    fn limit(count: i64, offset: Option<i64>) -> Limit {
        let literal = |n: i64| {
            if n < 0 {
                Expr::unary(UnaryOp::Negate, Expr::Literal(Literal::Integer(-n)))
            } else {
                Expr::Literal(Literal::Integer(n))
            }
        };
        Limit {
            count: literal(count),
            offset: offset.map(literal),
            position: Position::default(),
        }
    }

    #[test]
    fn test_limit_slices() {
        assert_eq!(compile_limit(Some(&limit(6, None))).unwrap().as_deref(), Some(".[:6]"));
        assert_eq!(
            compile_limit(Some(&limit(5, Some(6)))).unwrap().as_deref(),
            Some(".[6:11]")
        );
        assert_eq!(
            compile_limit(Some(&limit(-1, Some(3)))).unwrap().as_deref(),
            Some(".[3:]")
        );
        assert_eq!(compile_limit(Some(&limit(-1, Some(-4)))).unwrap(), None);
        assert_eq!(
            compile_limit(Some(&limit(2, Some(-4)))).unwrap().as_deref(),
            Some(".[:2]")
        );
    }
}
