//! Compile-and-run entry points.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::{
    cache::ProgramCache,
    compiler::CompileError,
    executor::{ExecError, JqRunner, Params, QueryResult, RunnerConfig},
    program::{compile, CompiledProgram},
};

/// Failure of a query, either before or while running it.
#[derive(Debug)]
pub enum QueryError {
    Compile(CompileError),
    Execution(ExecError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Compile(e) => write!(f, "Compile error: {}", e),
            QueryError::Execution(e) => write!(f, "Execution error: {}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Compile(e) => Some(e),
            QueryError::Execution(e) => Some(e),
        }
    }
}

impl From<CompileError> for QueryError {
    fn from(e: CompileError) -> Self {
        QueryError::Compile(e)
    }
}

impl From<ExecError> for QueryError {
    fn from(e: ExecError) -> Self {
        QueryError::Execution(e)
    }
}

/// Compiles queries and runs them with `jq`.
///
/// ```no_run
/// use mql_lang::Engine;
///
/// let engine = Engine::default().with_cache();
/// let result = engine
///     .query_file(r#"SELECT "SourceFile" WHERE "File:ImageHeight" > 2315"#, "metadata.json".as_ref())
///     .unwrap();
/// println!("{} rows", result.len());
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    runner: JqRunner,
    cache: Option<ProgramCache>,
    params: Params,
}

impl Engine {
    pub fn new(config: RunnerConfig) -> Self {
        Engine {
            runner: JqRunner::new(config),
            cache: None,
            params: Params::new(),
        }
    }

    /// Engine using `$MQL_JQ` (or `jq`) as the interpreter.
    pub fn from_env() -> Self {
        Engine::new(RunnerConfig::from_env())
    }

    /// Keep compiled programs between calls.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(ProgramCache::new());
        self
    }

    /// Values for the bind parameters of later queries.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Bind a single parameter.
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn runner(&self) -> &JqRunner {
        &self.runner
    }

    pub fn cache(&self) -> Option<&ProgramCache> {
        self.cache.as_ref()
    }

    pub fn compile(&self, query: &str) -> Result<Arc<CompiledProgram>, CompileError> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(query),
            None => compile(query).map(Arc::new),
        }
    }

    /// Run a query against a JSON file holding an array of records.
    pub fn query_file(&self, query: &str, path: &Path) -> Result<QueryResult, QueryError> {
        let program = self.compile(query)?;
        Ok(self.runner.run_file(&program, path, &self.params)?)
    }

    /// Run a query against JSON text holding an array of records.
    pub fn query_json(&self, query: &str, json: &str) -> Result<QueryResult, QueryError> {
        let program = self.compile(query)?;
        Ok(self.runner.run_json(&program, json, &self.params)?)
    }
}

/// Run a query against a file with the environment-configured interpreter.
pub fn query_file(query: &str, path: impl AsRef<Path>) -> Result<QueryResult, QueryError> {
    Engine::from_env().query_file(query, path.as_ref())
}

/// Run a query against JSON text with the environment-configured interpreter.
pub fn query_json(query: &str, json: &str) -> Result<QueryResult, QueryError> {
    Engine::from_env().query_json(query, json)
}
