//! prepstmt - prepared-statement lifecycle manager.
//!
//! Classifies command text, counts its placeholders, deduplicates and caches
//! prepared statements on a backend connection, and validates execution
//! results against per-command success criteria.

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod statement;

pub use connection::Session;
pub use error::{exec_code, PrepError, Result};
pub use query::ResultHolder;
pub use statement::{classify_command, count_parameters, CommandKind, Statement, StatementId};
