use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{
    compiler::CompileError,
    lexer::{Lexer, SpannedToken},
    program::{compile, CompiledProgram},
};

/// Compiled programs keyed by the normalized token text of their query.
///
/// Whitespace, comments and keyword case do not change the key, so
/// `select * where 1=1` and `SELECT *\nWHERE 1 = 1 -- all` share an entry.
#[derive(Debug, Default)]
pub struct ProgramCache {
    inner: Mutex<HashMap<String, Arc<CompiledProgram>>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for `query`, or `None` when it does not tokenize.
    ///
    /// Built from the tokens' debug form so `1` and `1.0` stay distinct.
    pub fn key(query: &str) -> Option<String> {
        let tokens = Lexer::new(query).tokenize().ok()?;
        Some(
            tokens
                .iter()
                .map(|SpannedToken { token, .. }| format!("{:?}", token))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    pub fn get(&self, key: &str) -> Option<Arc<CompiledProgram>> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: String, program: Arc<CompiledProgram>) {
        if let Ok(mut entries) = self.inner.lock() {
            entries.insert(key, program);
        }
    }

    /// Look the query up, compiling and storing it on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, query: &str) -> Result<Arc<CompiledProgram>, CompileError> {
        let Some(key) = Self::key(query) else {
            return compile(query).map(Arc::new);
        };
        if let Some(program) = self.get(&key) {
            return Ok(program);
        }
        let program = Arc::new(compile(query)?);
        self.insert(key, Arc::clone(&program));
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.inner.lock() {
            entries.clear();
        }
    }
}
