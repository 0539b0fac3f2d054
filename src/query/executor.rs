//! Execution of cached statements with result validation.
//!
//! Checks preconditions, delegates to the backend by statement name and
//! accepts the result only if its status fits the statement's command kind.

use tracing::{debug, warn};

use super::ResultHolder;
use crate::db::{Backend, BackendResult};
use crate::error::{PrepError, Result};
use crate::statement::{CommandKind, StatementCache, StatementId};

/// Runs cached statements against a backend.
pub struct Executor<'a> {
    backend: &'a mut dyn Backend,
    cache: &'a StatementCache,
}

impl<'a> Executor<'a> {
    /// Creates a new executor.
    pub fn new(backend: &'a mut dyn Backend, cache: &'a StatementCache) -> Self {
        Self { backend, cache }
    }

    /// Executes statement `id` with positional text parameters.
    ///
    /// Any result already in `holder` is released first. On success the new
    /// result is left in `holder`; on any failure `holder` is left invalid.
    pub async fn exec<S: AsRef<str>>(
        &mut self,
        id: StatementId,
        params: &[S],
        holder: &mut ResultHolder,
    ) -> Result<()> {
        holder.release();

        let stmt = self
            .cache
            .get(id)
            .ok_or(PrepError::UnknownStatementId(id))?;
        if !stmt.prepared {
            return Err(PrepError::StatementNotPrepared(id));
        }
        if params.len() != stmt.param_count {
            return Err(PrepError::ParameterCountMismatch {
                expected: stmt.param_count,
                actual: params.len(),
            });
        }

        let params: Vec<String> = params.iter().map(|p| p.as_ref().to_string()).collect();
        debug!("EXECUTE {} with {} params", stmt.name, params.len());

        let result = match self.backend.execute_prepared(&stmt.name, &params).await {
            Ok(result) => result,
            Err(e) => {
                let message = self.backend.last_error().unwrap_or_else(|| e.to_string());
                warn!("Execution error: {}", message);
                return Err(PrepError::execution_rejected(message, "no result"));
            }
        };

        if !validate_result(stmt.kind, Some(&result)) {
            let message = if result.error_message.is_empty() {
                self.backend.last_error().unwrap_or_else(|| {
                    format!("{} statement returned {}", stmt.kind, result.status)
                })
            } else {
                result.error_message.clone()
            };
            warn!("Execution error: {}", message);
            warn!("Result status: {}", result.status);
            return Err(PrepError::execution_rejected(message, result.status.as_str()));
        }

        holder.install(result);
        Ok(())
    }
}

/// Checks a backend result against the success criteria of `kind`.
///
/// An absent result is never acceptable.
pub fn validate_result(kind: CommandKind, result: Option<&BackendResult>) -> bool {
    result.is_some_and(|r| kind.accepts(r.status))
}
