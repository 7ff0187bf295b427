//! Assembly of a complete `jq` program from a parsed SELECT.

use std::fmt;

use log::{debug, warn};

use crate::{
    ast::SelectStatement,
    compiler::{string_literal, CompileError, ExprCompiler},
    lexer::Lexer,
    order::{compile_limit, compile_order},
    parser::Parser,
    resolver::{resolve_columns, Projection},
};

/// A query lowered to `jq`.
///
/// Pure text: the program holds no reference to any input and can be reused
/// against any number of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    /// Helper definitions required by the other fragments
    pub prelude: String,
    /// WHERE predicate, evaluated against each record
    pub filter: Option<String>,
    /// Object constructor building one output row; `None` for `SELECT *`
    pub projection: Option<String>,
    pub distinct: bool,
    /// `sort_by(...)`, possibly followed by `| reverse`
    pub order: Option<String>,
    /// Array slice applied last
    pub limit: Option<String>,
    /// Output column names; `None` when they come from the rows (`SELECT *`)
    pub columns: Option<Vec<String>>,
    /// Bind parameters the program expects, without the `$`
    pub parameters: Vec<String>,
}

impl CompiledProgram {
    /// The full program text.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[.[]", self.prelude)?;
        if let Some(filter) = &self.filter {
            write!(f, " | select({})", filter)?;
        }
        if let Some(projection) = &self.projection {
            write!(f, " | {}", projection)?;
        }
        write!(f, "]")?;
        if self.distinct {
            write!(f, " | unique")?;
        }
        if let Some(order) = &self.order {
            write!(f, " | {}", order)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " | {}", limit)?;
        }
        Ok(())
    }
}

/// Parse and compile query text.
pub fn compile(query: &str) -> Result<CompiledProgram, CompileError> {
    let mut parser = Parser::new(Lexer::new(query))?;
    let statement = parser.parse_query()?;
    let program = compile_statement(&statement)?;
    debug!("compiled {:?} into {}", query, program);
    Ok(program)
}

/// Compile an already parsed statement.
///
/// Stages run in the order filter, project, deduplicate, sort, slice.
pub fn compile_statement(statement: &SelectStatement) -> Result<CompiledProgram, CompileError> {
    let mut compiler = ExprCompiler::new();

    let projection = resolve_columns(&statement.columns)?;

    if statement.having.is_some() {
        warn!("HAVING clause ignored: aggregation is not supported");
    }

    let filter = statement
        .where_clause
        .as_ref()
        .map(|expr| compiler.compile(expr))
        .transpose()?;

    let projection_fragment = match &projection {
        Projection::All => None,
        Projection::Columns(columns) => {
            let mut entries = Vec::with_capacity(columns.len());
            for column in columns {
                let value = compiler.compile(&column.expr)?;
                entries.push(format!("{}: ({})", string_literal(&column.alias), value));
            }
            Some(format!("{{{}}}", entries.join(", ")))
        }
    };

    let order = compile_order(&statement.order_by, &projection)?.map(|o| o.fragment());
    let limit = compile_limit(statement.limit.as_ref())?;

    Ok(CompiledProgram {
        prelude: compiler.prelude(),
        filter,
        projection: projection_fragment,
        distinct: statement.is_distinct(),
        order,
        limit,
        columns: projection.aliases(),
        parameters: compiler.parameters().to_vec(),
    })
}
