//! Runs compiled programs through an external `jq` process.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::thread;

use log::debug;
use serde_json::{Map, Value};

use crate::program::CompiledProgram;

/// Environment variable overriding the interpreter binary.
pub const JQ_ENV: &str = "MQL_JQ";

/// Values for bind parameters, keyed by name without the `$`.
pub type Params = BTreeMap<String, Value>;

/// One output row.
pub type Row = Map<String, Value>;

#[derive(Debug)]
pub enum ExecError {
    /// The interpreter could not be started
    Spawn { binary: PathBuf, source: io::Error },
    /// The interpreter exited unsuccessfully
    Failed { status: ExitStatus, stderr: String },
    /// The program references a parameter with no value
    UnboundParameter(String),
    /// Talking to the child process failed
    Io(io::Error),
    /// The output was not JSON
    Decode(serde_json::Error),
    /// The output was JSON but not an array of objects
    UnexpectedOutput(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Spawn { binary, source } => {
                write!(f, "Could not start '{}': {}", binary.display(), source)
            }
            ExecError::Failed { status, stderr } => {
                write!(f, "jq failed ({}): {}", status, stderr.trim_end())
            }
            ExecError::UnboundParameter(name) => {
                write!(f, "No value bound for parameter '{}'", name)
            }
            ExecError::Io(e) => write!(f, "IO error: {}", e),
            ExecError::Decode(e) => write!(f, "Could not decode jq output: {}", e),
            ExecError::UnexpectedOutput(found) => {
                write!(f, "Expected jq to produce an array of objects, found {}", found)
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Spawn { source, .. } => Some(source),
            ExecError::Io(e) => Some(e),
            ExecError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        ExecError::Io(e)
    }
}

impl From<serde_json::Error> for ExecError {
    fn from(e: serde_json::Error) -> Self {
        ExecError::Decode(e)
    }
}

/// Rows produced by a query, plus the names of their columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, `Null` where a row lacks it.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&Value::Null))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub binary: PathBuf,
}

impl RunnerConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        RunnerConfig {
            binary: binary.into(),
        }
    }

    /// `$MQL_JQ` if set, `jq` otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(JQ_ENV) {
            Some(binary) if !binary.is_empty() => RunnerConfig::new(binary),
            _ => RunnerConfig::default(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig::new("jq")
    }
}

/// Where the records come from.
enum Input<'a> {
    File(&'a Path),
    Text(&'a str),
}

/// Executes programs with `jq -c`.
#[derive(Debug, Clone, Default)]
pub struct JqRunner {
    config: RunnerConfig,
}

impl JqRunner {
    pub fn new(config: RunnerConfig) -> Self {
        JqRunner { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run against a JSON file holding an array of records.
    pub fn run_file(
        &self,
        program: &CompiledProgram,
        path: &Path,
        params: &Params,
    ) -> Result<QueryResult, ExecError> {
        self.run(program, Input::File(path), params)
    }

    /// Run against JSON text, fed to the interpreter on stdin.
    pub fn run_json(
        &self,
        program: &CompiledProgram,
        json: &str,
        params: &Params,
    ) -> Result<QueryResult, ExecError> {
        self.run(program, Input::Text(json), params)
    }

    fn run(
        &self,
        program: &CompiledProgram,
        input: Input<'_>,
        params: &Params,
    ) -> Result<QueryResult, ExecError> {
        let text = program.text();
        let args = arguments(program, &text, params)?;

        let mut command = Command::new(&self.config.binary);
        command
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match input {
            Input::File(path) => {
                debug!("cat {} | jq -c '{}'", path.display(), text);
                command.arg(path).stdin(Stdio::null());
                command.output().map_err(|e| self.spawn_error(e))?
            }
            Input::Text(json) => {
                debug!("<stdin> | jq -c '{}'", text);
                command.stdin(Stdio::piped());
                self.pipe(command, json)?
            }
        };

        if !output.status.success() {
            return Err(ExecError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let rows = decode_rows(&output.stdout)?;
        let columns = match &program.columns {
            Some(columns) => columns.clone(),
            None => rows
                .first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        };

        debug!("jq returned {} row(s)", rows.len());
        Ok(QueryResult { columns, rows })
    }

    /// Write `json` to the child's stdin while its output is being collected.
    fn pipe(&self, mut command: Command, json: &str) -> Result<Output, ExecError> {
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin was not captured"))?;

        thread::scope(|scope| -> Result<Output, ExecError> {
            let writer = scope.spawn(move || -> io::Result<()> {
                match stdin.write_all(json.as_bytes()) {
                    // jq may exit early (e.g. on a syntax error) before reading everything
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            });
            let output = child.wait_with_output()?;
            writer
                .join()
                .map_err(|_| io::Error::other("stdin writer panicked"))??;
            Ok(output)
        })
    }

    fn spawn_error(&self, source: io::Error) -> ExecError {
        ExecError::Spawn {
            binary: self.config.binary.clone(),
            source,
        }
    }
}

/// Command line for jq, minus the input file.
fn arguments(
    program: &CompiledProgram,
    text: &str,
    params: &Params,
) -> Result<Vec<OsString>, ExecError> {
    let mut args: Vec<OsString> = vec!["-c".into()];
    for name in &program.parameters {
        let value = params
            .get(name)
            .ok_or_else(|| ExecError::UnboundParameter(name.clone()))?;
        args.push("--argjson".into());
        args.push(name.into());
        args.push(value.to_string().into());
    }
    // Programs start with `[` or `def`, never with `-`
    args.push(text.into());
    Ok(args)
}

fn decode_rows(stdout: &[u8]) -> Result<Vec<Row>, ExecError> {
    let value: Value = serde_json::from_slice(stdout)?;
    let Value::Array(items) = value else {
        return Err(ExecError::UnexpectedOutput(describe(&value)));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(ExecError::UnexpectedOutput(format!(
                "an array containing {}",
                describe(&other)
            ))),
        })
        .collect()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
