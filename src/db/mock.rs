//! Mock backend for testing.
//!
//! Provides an in-memory backend with scripted responses for unit tests,
//! integration tests and the `--mock-db` CLI mode.

use super::{Backend, BackendResult};
use crate::error::{PrepError, Result};
use crate::statement::{classify_command, CommandKind};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A call observed by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Prepare {
        name: String,
        text: String,
        param_count: usize,
    },
    Execute {
        name: String,
        params: Vec<String>,
    },
    Close,
}

/// A mock backend that records calls and returns scripted results.
///
/// The call log is shared, so it can still be inspected after the backend has
/// been moved into a session.
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Server-side registry: name -> (text, param_count).
    registry: HashMap<String, (String, usize)>,
    /// Scripted results keyed by command text.
    responses: HashMap<String, BackendResult>,
    /// Command texts whose preparation is refused.
    rejected: HashSet<String>,
    /// When set, execution produces no result at all.
    transport_failure: bool,
    last_error: Option<String>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl MockBackend {
    /// Creates a new mock backend with no scripted behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the result returned when the statement with this text is executed.
    pub fn with_response(mut self, text: impl Into<String>, result: BackendResult) -> Self {
        self.responses.insert(text.into(), result);
        self
    }

    /// Makes the backend refuse to prepare this exact text.
    pub fn reject_prepare(mut self, text: impl Into<String>) -> Self {
        self.rejected.insert(text.into());
        self
    }

    /// Makes every execution fail without producing a result.
    pub fn with_transport_failure(mut self) -> Self {
        self.transport_failure = true;
        self
    }

    /// Returns a handle to the shared call log.
    pub fn call_log(&self) -> Arc<Mutex<Vec<BackendCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Builds the default result for a statement without a scripted response.
    fn default_result(text: &str) -> BackendResult {
        let returns_rows = text.to_uppercase().contains("RETURNING");
        match classify_command(text) {
            Some(CommandKind::Select) => BackendResult::tuples(
                vec!["result".to_string()],
                vec![vec![Some(format!("Mock result for: {text}"))]],
            ),
            Some(kind) if returns_rows => BackendResult::tuples(
                vec!["result".to_string()],
                vec![vec![Some(format!("Mock {kind} row"))]],
            ),
            Some(CommandKind::Insert) => BackendResult::command_ok("INSERT 0 1", 1),
            Some(kind @ (CommandKind::Update | CommandKind::Delete)) => {
                BackendResult::command_ok(format!("{kind} 1"), 1)
            }
            Some(kind) => BackendResult::command_ok(kind.to_string(), 0),
            None => BackendResult::fatal(format!("syntax error at or near \"{text}\"")),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn prepare(&mut self, name: &str, text: &str, param_count: usize) -> Result<()> {
        self.record(BackendCall::Prepare {
            name: name.to_string(),
            text: text.to_string(),
            param_count,
        });

        if self.rejected.contains(text) {
            let msg = format!("mock backend refused to prepare \"{name}\"");
            self.last_error = Some(msg.clone());
            return Err(PrepError::prepare_rejected(msg));
        }
        if self.registry.contains_key(name) {
            let msg = format!("prepared statement \"{name}\" already exists");
            self.last_error = Some(msg.clone());
            return Err(PrepError::prepare_rejected(msg));
        }

        self.registry
            .insert(name.to_string(), (text.to_string(), param_count));
        self.last_error = None;
        Ok(())
    }

    async fn execute_prepared(&mut self, name: &str, params: &[String]) -> Result<BackendResult> {
        self.record(BackendCall::Execute {
            name: name.to_string(),
            params: params.to_vec(),
        });

        if self.transport_failure {
            let msg = "server closed the connection unexpectedly".to_string();
            self.last_error = Some(msg.clone());
            return Err(PrepError::execution_rejected(msg, "no result"));
        }

        let Some((text, param_count)) = self.registry.get(name) else {
            let msg = format!("prepared statement \"{name}\" does not exist");
            self.last_error = Some(msg.clone());
            return Ok(BackendResult::fatal(msg));
        };

        if params.len() != *param_count {
            let msg = format!(
                "bind message supplies {} parameters, but prepared statement \"{name}\" requires {param_count}",
                params.len()
            );
            self.last_error = Some(msg.clone());
            return Ok(BackendResult::fatal(msg));
        }

        let result = self
            .responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| Self::default_result(text));
        self.last_error = if result.error_message.is_empty() {
            None
        } else {
            Some(result.error_message.clone())
        };
        Ok(result)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.record(BackendCall::Close);
        self.registry.clear();
        Ok(())
    }
}
