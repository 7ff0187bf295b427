//! Execute MQL queries against JSON input

use std::path::PathBuf;

use serde_json::Value;

use super::CliError;
use crate::{Engine, Params, QueryResult, RunnerConfig};

/// Where the records for a check come from
#[derive(Debug, Clone, Default)]
pub enum InputSource {
    #[default]
    None,
    /// Path to a JSON file
    File(PathBuf),
    /// JSON text
    Json(String),
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The MQL query to execute
    pub query: String,
    pub input: InputSource,
    /// Only compile, don't execute
    pub syntax_only: bool,
    /// Interpreter to use instead of `$MQL_JQ` / `jq`
    pub jq: Option<PathBuf>,
    /// Bind parameter values
    pub params: Params,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Query compiled
    SyntaxValid,
    /// Query executed successfully
    Success(QueryResult),
}

/// Split a `NAME=JSON` argument.
///
/// Names are case-folded like the `:name` markers in queries. A value that is
/// not valid JSON is taken as a string, so `type=JPEG` works without quoting.
pub fn parse_param(arg: &str) -> Result<(String, Value), CliError> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| CliError::InvalidParam(arg.to_string()))?;
    let name = name.trim().trim_start_matches([':', '@', '$']);
    if name.is_empty() {
        return Err(CliError::InvalidParam(arg.to_string()));
    }
    let value =
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_lowercase(), value))
}

/// Execute an mql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let config = match &options.jq {
        Some(binary) => RunnerConfig::new(binary),
        None => RunnerConfig::from_env(),
    };
    let engine = Engine::new(config).with_params(options.params.clone());

    if options.syntax_only {
        engine.compile(&options.query)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let result = match &options.input {
        InputSource::File(path) => engine.query_file(&options.query, path)?,
        InputSource::Json(json) => engine.query_json(&options.query, json)?,
        InputSource::None => return Err(CliError::NoInput),
    };
    Ok(CheckResult::Success(result))
}
