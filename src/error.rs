// ⚠️ Error Taxonomy - Storage failures classified for clients
//
// Every failure leaving the ledger is one of four kinds. Raw rusqlite errors
// never cross the ledger boundary unclassified.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A uniqueness rule would be violated
    #[error("{0}")]
    Duplicate(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Input rejected before reaching storage
    #[error("{0}")]
    Invalid(String),

    /// Any other storage or unexpected failure
    #[error("{0}")]
    Internal(String),
}

impl LedgerError {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Duplicate(_) => "duplicate",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Invalid(_) => "invalid",
            LedgerError::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LedgerError::Duplicate(msg)
            | LedgerError::NotFound(msg)
            | LedgerError::Invalid(msg)
            | LedgerError::Internal(msg) => msg,
        }
    }
}

/// True when SQLite rejected the statement because of a UNIQUE or PRIMARY KEY constraint
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Classify a storage failure. `duplicate_message` is used only when the
/// failure is a uniqueness violation.
pub fn classify(err: rusqlite::Error, duplicate_message: impl FnOnce() -> String) -> LedgerError {
    if is_unique_violation(&err) {
        LedgerError::Duplicate(duplicate_message())
    } else {
        LedgerError::Internal(format!("Database error: {}", err))
    }
}

/// Storage failures with no uniqueness meaning (reads, pragmas, commits)
impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Internal(format!("Database error: {}", err))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
