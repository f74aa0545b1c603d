//! Error types for reconciliation store operations.

use std::fmt;

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// SQLite primary result codes that mean another connection holds the file.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// What went wrong underneath a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDbErrorKind {
    /// The file is held by another run; retrying shortly can succeed.
    BusyOrLocked,
    /// The pool had no free connection in time.
    PoolTimeout,
    /// Unique, not-null or check constraint rejected the write.
    ConstraintViolation,
    /// Anything else, including a closed pool or an IO failure.
    Other,
}

impl StoreDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::Database(database_error) => Self::from_database(database_error.as_ref()),
            _ => Self::Other,
        }
    }

    fn from_database(error: &dyn DatabaseError) -> Self {
        // sqlx reports SQLite extended codes; the low byte is the primary code.
        let primary = error
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);
        if matches!(primary, Some(SQLITE_BUSY | SQLITE_LOCKED)) {
            return Self::BusyOrLocked;
        }
        match error.kind() {
            ErrorKind::UniqueViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                Self::ConstraintViolation
            }
            _ => Self::Other,
        }
    }

    /// Busy files and exhausted pools clear up on their own.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::BusyOrLocked | Self::PoolTimeout)
    }

    fn hint(self) -> &'static str {
        match self {
            Self::BusyOrLocked | Self::PoolTimeout => {
                "\n  Suggestion: another traxiv run may be using the database; retry when it finishes"
            }
            Self::ConstraintViolation | Self::Other => "",
        }
    }
}

impl fmt::Display for StoreDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BusyOrLocked => "database busy",
            Self::PoolTimeout => "no free connection",
            Self::ConstraintViolation => "constraint violated",
            Self::Other => "database failure",
        })
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{kind}: {message}{}", .kind.hint())]
    Database {
        kind: StoreDbErrorKind,
        message: String,
    },

    /// An operation ran before `select_group`.
    #[error("no group selected\n  Suggestion: call select_group with the annotation group id first")]
    NoGroupSelected,

    /// A stored sub-document could not be (de)serialized.
    #[error("stored entry for {preprint_doi} is malformed: {message}")]
    Serialization {
        preprint_doi: String,
        message: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: StoreDbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl StoreError {
    pub(crate) fn serialization(preprint_doi: &str, err: &serde_json::Error) -> Self {
        Self::Serialization {
            preprint_doi: preprint_doi.to_string(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn database_kind(&self) -> Option<StoreDbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::NoGroupSelected | Self::Serialization { .. } => None,
        }
    }

    /// True when the same call may succeed after a short wait.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.database_kind().is_some_and(StoreDbErrorKind::is_transient)
    }
}
