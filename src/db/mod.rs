//! Backend abstraction layer for prepstmt.
//!
//! The backend is the opaque engine that owns the server-side registry of
//! prepared statements. The core only ever talks to it through the narrow
//! [`Backend`] trait: prepare by name, execute by name, report the last error,
//! close.

mod mock;
mod postgres;
mod types;

pub use mock::{BackendCall, MockBackend};
pub use postgres::PostgresBackend;
pub use types::{BackendResult, ResultStatus, Row};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
}

impl DatabaseBackend {
    /// Returns the backend as a string for configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
        }
    }
}

/// Opens a backend connection for the given configuration.
///
/// A single attempt is made; failures are reported to the caller unchanged.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn Backend>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let backend = PostgresBackend::connect(config).await?;
            Ok(Box::new(backend))
        }
    }
}

/// Narrow contract to the backend's native prepare/execute transport.
#[async_trait]
pub trait Backend: Send {
    /// Registers `text` under `name` with `param_count` untyped parameters.
    ///
    /// Returns `PrepError::BackendPrepareRejected` if the backend refuses it.
    async fn prepare(&mut self, name: &str, text: &str, param_count: usize) -> Result<()>;

    /// Executes the statement registered as `name` with positional text parameters.
    ///
    /// An `Err` means no result was produced at all. Statement-level failures
    /// come back as `Ok` with a failing [`ResultStatus`].
    async fn execute_prepared(&mut self, name: &str, params: &[String]) -> Result<BackendResult>;

    /// Returns the most recent connection-level error message, if any.
    fn last_error(&self) -> Option<String>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<()>;
}
