//! Integration tests for prepstmt.

pub mod postgres_test;
pub mod session_test;
