//! Prepared statement model.
//!
//! Classifies command text, counts its placeholders and keeps the cache of
//! statements that the backend has accepted.

mod cache;
mod classify;
mod params;

pub use cache::StatementCache;
pub use classify::classify_command;
pub use params::{count_parameters, missing_placeholders};

use crate::db::ResultStatus;
use serde::Serialize;
use std::fmt;

/// Identifier of a cached statement. Assigned from 1 upwards.
pub type StatementId = u32;

/// Coarse category of a command, used to pick the success-status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Truncate,
}

impl CommandKind {
    /// Returns true if a result with `status` counts as success for this kind.
    pub fn accepts(&self, status: ResultStatus) -> bool {
        match self {
            Self::Select => status == ResultStatus::TuplesOk,
            Self::Insert | Self::Update | Self::Delete | Self::Truncate => {
                matches!(status, ResultStatus::CommandOk | ResultStatus::TuplesOk)
            }
            Self::Create | Self::Alter | Self::Drop => status == ResultStatus::CommandOk,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Create => write!(f, "CREATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
        }
    }
}

/// One command registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Cache identifier.
    pub id: StatementId,
    /// Name in the backend's prepared-statement registry.
    pub name: String,
    /// Original command text; the deduplication key.
    pub command: String,
    /// Highest placeholder index found in `command`.
    pub param_count: usize,
    /// Command kind determined at preparation.
    pub kind: CommandKind,
    /// Whether the backend accepted the statement.
    pub prepared: bool,
}
