//! Error types for prepstmt.
//!
//! Defines the error enum shared by the statement cache, the executor and the
//! connection bootstrap.

use std::ops::RangeInclusive;
use thiserror::Error;

/// Main error type for prepstmt operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrepError {
    /// No backend connection is installed (never connected, or cleaned up).
    #[error("Connection not initialized")]
    ConnectionUninitialized,

    /// Command text was empty.
    #[error("Empty command text")]
    EmptyCommandText,

    /// The command text could not be mapped to a supported command kind.
    #[error("Unsupported command kind: {0}")]
    UnsupportedCommandKind(String),

    /// Placeholder indices are not contiguous and strict checking is enabled.
    #[error("Placeholder gap: missing {missing:?} (highest index is ${highest})")]
    PlaceholderGap {
        missing: Vec<RangeInclusive<usize>>,
        highest: usize,
    },

    /// The backend refused to prepare the statement.
    #[error("Prepare rejected: {0}")]
    BackendPrepareRejected(String),

    /// No statement is cached under the given id.
    #[error("Statement ID {0} not found")]
    UnknownStatementId(u32),

    /// The cached statement is not marked prepared.
    #[error("Statement {0} is not prepared")]
    StatementNotPrepared(u32),

    /// The number of supplied parameters does not match the statement's arity.
    #[error("Expected {expected} parameters, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// The backend failed the execution or returned an unacceptable status.
    #[error("Execution error: {message} (status: {status})")]
    BackendExecutionRejected { message: String, status: String },

    /// Connection bootstrap errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PrepError {
    /// Creates an unsupported-kind error for the given command text.
    pub fn unsupported(command: &str) -> Self {
        Self::UnsupportedCommandKind(preview(command))
    }

    /// Creates a prepare-rejected error with the given message.
    pub fn prepare_rejected(msg: impl Into<String>) -> Self {
        Self::BackendPrepareRejected(msg.into())
    }

    /// Creates an execution-rejected error with a diagnostic and the backend status text.
    pub fn execution_rejected(msg: impl Into<String>, status: impl Into<String>) -> Self {
        Self::BackendExecutionRejected {
            message: msg.into(),
            status: status.into(),
        }
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the numeric code reported by `exec` for this error, if it is an
    /// execution error.
    ///
    /// `0` is reserved for success and never returned here.
    pub fn exec_code(&self) -> Option<u8> {
        match self {
            Self::ConnectionUninitialized => Some(1),
            Self::UnknownStatementId(_) => Some(2),
            Self::StatementNotPrepared(_) => Some(3),
            Self::ParameterCountMismatch { .. } => Some(4),
            Self::BackendExecutionRejected { .. } => Some(5),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConnectionUninitialized | Self::Connection(_) => "Connection Error",
            Self::EmptyCommandText
            | Self::UnsupportedCommandKind(_)
            | Self::PlaceholderGap { .. }
            | Self::BackendPrepareRejected(_) => "Prepare Error",
            Self::UnknownStatementId(_)
            | Self::StatementNotPrepared(_)
            | Self::ParameterCountMismatch { .. }
            | Self::BackendExecutionRejected { .. } => "Execution Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Maps an `exec` outcome to its numeric code (`0` on success).
pub fn exec_code(outcome: &Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) => e.exec_code().unwrap_or(5),
    }
}

fn preview(command: &str) -> String {
    const MAX: usize = 32;
    let trimmed = command.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Result type alias using PrepError.
pub type Result<T> = std::result::Result<T, PrepError>;
