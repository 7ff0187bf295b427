//! MQL: a SELECT dialect over arrays of JSON metadata records, compiled to `jq`.
//!
//! ```no_run
//! let program = mql_lang::compile(r#"SELECT "SourceFile" WHERE "File:FileType" LIKE 'j%g'"#).unwrap();
//! println!("{}", program);
//!
//! let result = mql_lang::query_file("SELECT * LIMIT 6", "metadata.json").unwrap();
//! assert!(result.len() <= 6);
//! ```
pub mod ast;
pub mod cache;
pub mod cli;
pub mod compiler;
pub mod engine;
pub mod executor;
pub mod lexer;
pub mod order;
pub mod output;
pub mod parser;
pub mod program;
pub mod resolver;

pub use ast::{BinOp, Expr, SelectStatement, Token};
pub use cache::ProgramCache;
pub use compiler::{CompileError, ExprCompiler};
pub use engine::{query_file, query_json, Engine, QueryError};
pub use executor::{ExecError, JqRunner, Params, QueryResult, Row, RunnerConfig};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty, to_table};
pub use parser::{ParseError, Parser};
pub use program::{compile, compile_statement, CompiledProgram};
pub use resolver::{Column, Projection};
