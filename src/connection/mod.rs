//! Connection management for prepstmt.
//!
//! Ties a backend connection to the statements prepared on it.

pub mod session;

pub use session::Session;
