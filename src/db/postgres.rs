//! PostgreSQL backend implementation.
//!
//! Provides the `PostgresBackend` struct that implements the `Backend` trait
//! on top of a single dedicated sqlx connection. Server-side named prepared
//! statements live in the session that created them, so a pool is never used.

use crate::config::ConnectionConfig;
use crate::db::{Backend, BackendResult, Row};
use crate::error::{PrepError, Result};
use crate::statement::{classify_command, CommandKind};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column as SqlxColumn, Connection, Either, Executor, Row as SqlxRow, Statement};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// How a registered statement is run.
#[derive(Debug, Clone)]
enum Registered {
    /// Server-side `PREPARE`d; column names are empty for commands without rows.
    Prepared { columns: Vec<String> },
    /// DDL and TRUNCATE cannot be `PREPARE`d, so their text is kept and run as is.
    Utility { text: String },
}

/// PostgreSQL backend bound to one connection.
#[derive(Debug)]
pub struct PostgresBackend {
    conn: Option<PgConnection>,
    registry: HashMap<String, Registered>,
    last_error: Option<String>,
}

impl PostgresBackend {
    /// Opens a connection for the given configuration.
    ///
    /// A single attempt is made; there is no retry.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Connecting to {}", config.display_string());

        let conn = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            PgConnection::connect(&conn_str),
        )
        .await
        .map_err(|_| {
            PrepError::connection(format!(
                "Connection to {} timed out after {CONNECT_TIMEOUT_SECS} seconds",
                config.display_string()
            ))
        })?
        .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already established connection.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn: Some(conn),
            registry: HashMap::new(),
            last_error: None,
        }
    }

    fn conn_mut(&mut self) -> Result<&mut PgConnection> {
        self.conn.as_mut().ok_or(PrepError::ConnectionUninitialized)
    }

    async fn describe_and_prepare(
        conn: &mut PgConnection,
        name: &str,
        text: &str,
    ) -> std::result::Result<Registered, sqlx::Error> {
        // Describing first keeps rejected text out of the server-side registry.
        let statement = Executor::prepare(&mut *conn, text).await?;

        if is_utility(text) {
            return Ok(Registered::Utility {
                text: text.to_string(),
            });
        }

        let columns = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let sql = format!("PREPARE {name} AS {text}");
        conn.execute(sqlx::raw_sql(&sql)).await?;
        Ok(Registered::Prepared { columns })
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn prepare(&mut self, name: &str, text: &str, param_count: usize) -> Result<()> {
        if param_count > 0 && is_utility(text) {
            let msg = format!("{name}: utility commands cannot take parameters");
            self.last_error = Some(msg.clone());
            return Err(PrepError::prepare_rejected(msg));
        }

        let conn = self.conn_mut()?;
        debug!("PREPARE {} ({} params)", name, param_count);

        match Self::describe_and_prepare(conn, name, text).await {
            Ok(registered) => {
                self.registry.insert(name.to_string(), registered);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                let msg = format_query_error(e);
                self.last_error = Some(msg.clone());
                Err(PrepError::prepare_rejected(msg))
            }
        }
    }

    async fn execute_prepared(&mut self, name: &str, params: &[String]) -> Result<BackendResult> {
        let (sql, described) = match self.registry.get(name) {
            Some(Registered::Utility { text }) => (text.clone(), Vec::new()),
            Some(Registered::Prepared { columns }) => (execute_sql(name, params), columns.clone()),
            // Let the server report the unknown name.
            None => (execute_sql(name, params), Vec::new()),
        };
        let conn = self.conn_mut()?;

        let mut rows: Vec<Row> = Vec::new();
        let mut columns = described;
        let mut rows_affected = 0u64;
        let mut failure = None;

        {
            let mut stream = sqlx::raw_sql(&sql).fetch_many(&mut *conn);
            loop {
                match stream.try_next().await {
                    Ok(Some(Either::Left(done))) => rows_affected += done.rows_affected(),
                    Ok(Some(Either::Right(row))) => {
                        if columns.is_empty() {
                            columns = row
                                .columns()
                                .iter()
                                .map(|col| col.name().to_string())
                                .collect();
                        }
                        rows.push(convert_row(&row));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        if let Some(e) = failure {
            let is_statement_error = e.as_database_error().is_some();
            let msg = format_query_error(e);
            self.last_error = Some(msg.clone());
            if is_statement_error {
                return Ok(BackendResult::fatal(msg));
            }
            warn!("Execution of {} produced no result: {}", name, msg);
            return Err(PrepError::execution_rejected(msg, "no result"));
        }

        self.last_error = None;
        let result = if columns.is_empty() {
            BackendResult::command_ok(String::new(), rows_affected)
        } else {
            let mut result = BackendResult::tuples(columns, rows);
            result.command_tag = String::new();
            result
        };
        Ok(result)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.registry.clear();
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        if let Err(e) = conn.execute(sqlx::raw_sql("DEALLOCATE ALL")).await {
            warn!("Failed to deallocate prepared statements: {}", e);
        }
        conn.close()
            .await
            .map_err(|e| PrepError::connection(format!("Failed to close connection: {e}")))
    }
}

/// Returns true for commands that SQL-level `PREPARE` does not accept.
fn is_utility(text: &str) -> bool {
    matches!(
        classify_command(text),
        Some(CommandKind::Create | CommandKind::Alter | CommandKind::Drop | CommandKind::Truncate)
    )
}

/// Builds the `EXECUTE` command for a prepared statement.
///
/// Parameters travel as untyped text literals, coerced by the server to the
/// types inferred at prepare time.
fn execute_sql(name: &str, params: &[String]) -> String {
    if params.is_empty() {
        return format!("EXECUTE {name}");
    }
    let literals: Vec<String> = params.iter().map(|p| quote_literal(p)).collect();
    format!("EXECUTE {name}({})", literals.join(", "))
}

/// Quotes a string as a SQL text literal.
fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    if value.contains('\\') {
        out.push('E');
    }
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Converts a sqlx PgRow to text cells.
///
/// The simple-query protocol always delivers text, so every column decodes as
/// a string regardless of its declared type.
fn convert_row(row: &PgRow) -> Row {
    (0..row.columns().len())
        .map(|i| row.try_get_unchecked::<Option<String>, _>(i).ok().flatten())
        .collect()
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> PrepError {
    let host = config.host.as_deref().unwrap_or(crate::config::DEFAULT_HOST);
    let port = config.port;
    let user = config.user.as_deref().unwrap_or(crate::config::DEFAULT_USER);
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        PrepError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        PrepError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        PrepError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        PrepError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else {
        PrepError::connection(error.to_string())
    }
}

/// Formats a backend error with detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
