//! Execution result holder.
//!
//! A `ResultHolder` exclusively owns at most one backend result. Only the
//! executor can put a result into it; callers get read-only, bounds-checked
//! access.

use std::fmt;

use crate::db::{BackendResult, ResultStatus, Row};

/// Exclusive owner of one execution result.
#[derive(Debug, Default)]
pub struct ResultHolder {
    result: Option<BackendResult>,
}

impl ResultHolder {
    /// Creates an empty (invalid) holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the holder owns a result.
    pub fn is_valid(&self) -> bool {
        self.result.is_some()
    }

    /// Number of rows, or -1 if the holder is invalid.
    pub fn row_count(&self) -> i64 {
        self.result.as_ref().map_or(-1, |r| r.rows.len() as i64)
    }

    /// Number of columns, or -1 if the holder is invalid.
    pub fn column_count(&self) -> i64 {
        self.result.as_ref().map_or(-1, |r| r.columns.len() as i64)
    }

    /// Text of one cell.
    ///
    /// Empty when the holder is invalid, either index is out of bounds, or the
    /// cell is NULL.
    pub fn cell_text(&self, row: usize, col: usize) -> &str {
        self.cell(row, col).flatten().unwrap_or("")
    }

    /// Returns true if the cell exists and is NULL.
    pub fn is_null(&self, row: usize, col: usize) -> bool {
        matches!(self.cell(row, col), Some(None))
    }

    fn cell(&self, row: usize, col: usize) -> Option<Option<&str>> {
        let result = self.result.as_ref()?;
        if col >= result.columns.len() {
            return None;
        }
        result.rows.get(row)?.get(col).map(|cell| cell.as_deref())
    }

    /// Name of a column, if the holder is valid and the index in bounds.
    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.result.as_ref()?.columns.get(col).map(String::as_str)
    }

    /// All column names; empty when invalid.
    pub fn columns(&self) -> &[String] {
        self.result.as_ref().map_or(&[], |r| &r.columns)
    }

    /// All rows; empty when invalid.
    pub fn rows(&self) -> &[Row] {
        self.result.as_ref().map_or(&[], |r| &r.rows)
    }

    /// Backend status of the owned result.
    pub fn status(&self) -> Option<ResultStatus> {
        self.result.as_ref().map(|r| r.status)
    }

    /// Backend error message of the owned result; empty when invalid.
    pub fn error_message(&self) -> &str {
        self.result.as_ref().map_or("", |r| &r.error_message)
    }

    /// Command completion tag; empty when invalid or not reported.
    pub fn command_tag(&self) -> &str {
        self.result.as_ref().map_or("", |r| &r.command_tag)
    }

    /// Rows affected as reported by the backend.
    pub fn rows_affected(&self) -> Option<u64> {
        self.result.as_ref().map(|r| r.rows_affected)
    }

    /// Installs a new result, releasing the previous one first.
    pub(crate) fn install(&mut self, result: BackendResult) {
        self.release();
        self.result = Some(result);
    }

    /// Releases the owned result, leaving the holder invalid.
    pub(crate) fn release(&mut self) {
        self.result = None;
    }
}

impl fmt::Display for ResultHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Result(Valid: {}, Rows: {}, Columns: {})",
            self.is_valid(),
            self.row_count(),
            self.column_count()
        )
    }
}
