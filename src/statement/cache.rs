//! Statement cache.
//!
//! Deduplicates command text and keeps every statement the backend accepted,
//! keyed by a gap-free id sequence.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{
    classify_command, count_parameters, missing_placeholders, Statement, StatementId,
};
use crate::config::SessionConfig;
use crate::db::Backend;
use crate::error::{PrepError, Result};

/// Cache of prepared statements.
///
/// Ids start at 1. The next id is only consumed once the backend accepts a
/// statement, so rejected preparations leave no holes in the sequence.
#[derive(Debug, Default)]
pub struct StatementCache {
    statements: HashMap<StatementId, Statement>,
    by_text: HashMap<String, StatementId>,
    last_id: StatementId,
}

impl StatementCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares `text` on `backend`, or returns the id it was already cached under.
    pub async fn prepare(
        &mut self,
        backend: &mut dyn Backend,
        text: &str,
        config: &SessionConfig,
    ) -> Result<StatementId> {
        if text.is_empty() {
            return Err(PrepError::EmptyCommandText);
        }

        if let Some(id) = self.lookup(text) {
            debug!("Statement {} reused from cache", id);
            return Ok(id);
        }

        let kind = classify_command(text).ok_or_else(|| PrepError::unsupported(text))?;
        let param_count = count_parameters(text);

        let missing = missing_placeholders(text);
        if !missing.is_empty() {
            if config.strict_placeholders {
                return Err(PrepError::PlaceholderGap {
                    missing,
                    highest: param_count,
                });
            }
            warn!(
                "Placeholders {:?} never appear; arity is still {}",
                missing, param_count
            );
        }

        let id = self.candidate_id();
        let name = config.statement_name(id);

        if let Err(e) = backend.prepare(&name, text, param_count).await {
            warn!("Backend rejected {} ({}): {}", name, kind, e);
            return Err(e);
        }

        debug!("Prepared {} as {} with {} params", kind, name, param_count);
        self.insert(Statement {
            id,
            name,
            command: text.to_string(),
            param_count,
            kind,
            prepared: true,
        });
        Ok(id)
    }

    /// Returns the id of the statement with exactly this text, if cached.
    pub fn lookup(&self, text: &str) -> Option<StatementId> {
        self.by_text.get(text).copied()
    }

    /// Returns the statement cached under `id`.
    pub fn get(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(&id)
    }

    pub fn contains(&self, id: StatementId) -> bool {
        self.statements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns all cached statements ordered by id.
    pub fn statements(&self) -> Vec<&Statement> {
        let mut all: Vec<&Statement> = self.statements.values().collect();
        all.sort_by_key(|s| s.id);
        all
    }

    /// Removes every statement and resets the id sequence to zero.
    pub fn clear(&mut self) {
        self.statements.clear();
        self.by_text.clear();
        self.last_id = 0;
    }

    /// The id the next accepted statement will get.
    fn candidate_id(&self) -> StatementId {
        self.last_id + 1
    }

    fn insert(&mut self, statement: Statement) {
        debug_assert_eq!(statement.id, self.candidate_id());
        self.last_id = statement.id;
        // First writer wins for a given text.
        self.by_text
            .entry(statement.command.clone())
            .or_insert(statement.id);
        self.statements.insert(statement.id, statement);
    }
}
