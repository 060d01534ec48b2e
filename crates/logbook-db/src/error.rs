use std::fmt;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Which unique column a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Other,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Other => "unknown column",
        })
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// A `UNIQUE` constraint rejected the write.
    #[error("Unique constraint violated on {0}")]
    UniqueViolation(UniqueField),

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("DB lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match unique_violation(&err) {
            Some(field) => Self::UniqueViolation(field),
            None => Self::Sqlite(err),
        }
    }
}

/// SQLite reports unique failures as `UNIQUE constraint failed: scribes.username`.
fn unique_violation(err: &rusqlite::Error) -> Option<UniqueField> {
    let rusqlite::Error::SqliteFailure(code, message) = err else {
        return None;
    };
    let message = message.as_deref().unwrap_or_default();
    if code.code != ErrorCode::ConstraintViolation
        || !message.starts_with("UNIQUE constraint failed")
    {
        return None;
    }

    let field = if message.contains("scribes.username") {
        UniqueField::Username
    } else if message.contains("scribes.email") {
        UniqueField::Email
    } else {
        UniqueField::Other
    };
    Some(field)
}
