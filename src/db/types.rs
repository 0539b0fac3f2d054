//! Backend result types for prepstmt.
//!
//! Defines the raw result a backend hands back for one execution. Values are
//! exchanged as text; SQL NULL is `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status class of a backend result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    /// The command string was empty.
    EmptyQuery,
    /// A command that returns no data completed.
    CommandOk,
    /// A command that returns data completed (possibly with zero rows).
    TuplesOk,
    /// The server's response was not understood.
    BadResponse,
    /// A notice or warning occurred.
    NonfatalError,
    /// A fatal error occurred.
    FatalError,
}

impl ResultStatus {
    /// Returns the backend's textual name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "PGRES_EMPTY_QUERY",
            Self::CommandOk => "PGRES_COMMAND_OK",
            Self::TuplesOk => "PGRES_TUPLES_OK",
            Self::BadResponse => "PGRES_BAD_RESPONSE",
            Self::NonfatalError => "PGRES_NONFATAL_ERROR",
            Self::FatalError => "PGRES_FATAL_ERROR",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of text cells; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// The raw outcome of one backend execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendResult {
    /// Status class reported by the backend.
    pub status: ResultStatus,

    /// Column names, empty for commands without a row description.
    pub columns: Vec<String>,

    /// Rows of text cells.
    pub rows: Vec<Row>,

    /// Backend error message, empty on success.
    #[serde(default)]
    pub error_message: String,

    /// Command completion tag (e.g. `INSERT 0 1`).
    #[serde(default)]
    pub command_tag: String,

    /// Rows affected as reported by the backend.
    #[serde(default)]
    pub rows_affected: u64,
}

impl BackendResult {
    /// Creates a command-completed result with no columns.
    pub fn command_ok(command_tag: impl Into<String>, rows_affected: u64) -> Self {
        Self {
            status: ResultStatus::CommandOk,
            columns: Vec::new(),
            rows: Vec::new(),
            error_message: String::new(),
            command_tag: command_tag.into(),
            rows_affected,
        }
    }

    /// Creates a rows-returned result with the given columns and rows.
    pub fn tuples(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            status: ResultStatus::TuplesOk,
            columns,
            rows,
            error_message: String::new(),
            command_tag: format!("SELECT {rows_affected}"),
            rows_affected,
        }
    }

    /// Creates a fatal-error result carrying the backend's message.
    pub fn fatal(error_message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::FatalError,
            columns: Vec::new(),
            rows: Vec::new(),
            error_message: error_message.into(),
            command_tag: String::new(),
            rows_affected: 0,
        }
    }

    /// Sets the status, keeping everything else.
    pub fn with_status(mut self, status: ResultStatus) -> Self {
        self.status = status;
        self
    }
}
