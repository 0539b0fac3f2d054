//! Statement execution and result ownership.
//!
//! The executor is the only component that installs results into a
//! [`ResultHolder`].

pub mod executor;
mod result;

pub use executor::{validate_result, Executor};
pub use result::ResultHolder;
