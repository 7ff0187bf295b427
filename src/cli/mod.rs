//! CLI support for mql-lang
//!
//! Provides programmatic access to the `mql` subcommands for embedding in
//! other tools.

mod check;
mod compile;

pub use check::{execute_check, parse_param, CheckOptions, CheckResult, InputSource};
pub use compile::execute_compile;

use std::io;

use crate::{CompileError, QueryError};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Query failed to compile or run
    Query(QueryError),
    /// `--param` value that is not `NAME=JSON`
    InvalidParam(String),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Query(e) => write!(f, "{}", e),
            CliError::InvalidParam(p) => {
                write!(f, "Invalid parameter '{}': expected NAME=JSON", p)
            }
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(
                f,
                "No input provided. Use --file, --input or pipe JSON to stdin."
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Query(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        CliError::Query(e)
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        CliError::Query(QueryError::Compile(e))
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
