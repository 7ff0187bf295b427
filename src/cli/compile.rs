//! Print the jq program for a query

use super::CliError;
use crate::compile;

/// Compile a query and return the program text.
pub fn execute_compile(query: &str) -> Result<String, CliError> {
    Ok(compile(query)?.text())
}
