//! Session: one backend connection plus its statement cache.
//!
//! A `Session` is the owned instance every operation goes through. Mutating
//! operations take `&mut self`, so a session is used by one owner at a time;
//! sharing one across tasks means wrapping it in a mutex.

use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, SessionConfig};
use crate::db::Backend;
use crate::error::{PrepError, Result};
use crate::query::{Executor, ResultHolder};
use crate::statement::{Statement, StatementCache, StatementId};

/// Owns a backend connection and the statements prepared on it.
pub struct Session {
    backend: Option<Box<dyn Backend>>,
    cache: StatementCache,
    config: SessionConfig,
}

impl Session {
    /// Creates a session over an established backend with default settings.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::with_config(Box::new(backend), SessionConfig::default())
    }

    /// Creates a session over an established backend.
    pub fn with_config(backend: Box<dyn Backend>, config: SessionConfig) -> Self {
        Self {
            backend: Some(backend),
            cache: StatementCache::new(),
            config,
        }
    }

    /// Creates a session with no connection. Every operation fails until
    /// [`Session::init`] installs one.
    pub fn uninitialized(config: SessionConfig) -> Self {
        Self {
            backend: None,
            cache: StatementCache::new(),
            config,
        }
    }

    /// Connects to the database described by `conn` and returns a ready session.
    pub async fn connect(conn: &ConnectionConfig, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let backend = crate::db::connect(conn).await?;
        info!("Connected to {}", conn.display_string());
        Ok(Self::with_config(backend, config))
    }

    /// Installs a backend, closing any previous one and starting from an empty cache.
    pub async fn init(&mut self, backend: Box<dyn Backend>) {
        self.cleanup().await;
        self.backend = Some(backend);
    }

    /// Check if there's an installed connection.
    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Prepares `text`, returning its statement id.
    ///
    /// Preparing text that is already cached returns the existing id without
    /// contacting the backend.
    pub async fn prepare_statement(&mut self, text: &str) -> Result<StatementId> {
        let backend = self
            .backend
            .as_deref_mut()
            .ok_or(PrepError::ConnectionUninitialized)?;
        self.cache.prepare(backend, text, &self.config).await
    }

    /// Executes statement `id` with positional text parameters into `holder`.
    ///
    /// Use [`crate::error::exec_code`] to turn the outcome into the numeric code.
    pub async fn exec<S: AsRef<str>>(
        &mut self,
        id: StatementId,
        params: &[S],
        holder: &mut ResultHolder,
    ) -> Result<()> {
        let Some(backend) = self.backend.as_deref_mut() else {
            holder.release();
            return Err(PrepError::ConnectionUninitialized);
        };
        Executor::new(backend, &self.cache)
            .exec(id, params, holder)
            .await
    }

    /// Check if a statement id is cached.
    pub fn statement_exists(&self, id: StatementId) -> bool {
        self.cache.contains(id)
    }

    /// Number of cached statements.
    pub fn statement_count(&self) -> usize {
        self.cache.len()
    }

    /// Returns the statement cached under `id`.
    pub fn statement(&self, id: StatementId) -> Option<&Statement> {
        self.cache.get(id)
    }

    /// All cached statements ordered by id.
    pub fn statements(&self) -> Vec<&Statement> {
        self.cache.statements()
    }

    /// The connection's most recent error message, if any.
    pub fn last_error(&self) -> Option<String> {
        self.backend.as_ref().and_then(|b| b.last_error())
    }

    /// Clears the cache, resets the id sequence and closes the connection.
    ///
    /// Safe to call more than once.
    pub async fn cleanup(&mut self) {
        self.cache.clear();
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.close().await {
                warn!("Error while closing connection: {}", e);
            }
            debug!("Connection released");
        }
    }
}
