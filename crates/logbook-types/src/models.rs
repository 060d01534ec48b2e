use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

pub type ScribeId = i64;

/// Who may read an entry. Only the owner can read a private one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("visibility must be either 'public' or 'private', got '{0}'")]
pub struct InvalidVisibility(pub String);

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = InvalidVisibility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(InvalidVisibility(other.to_string())),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scribe as seen by the API. The password hash never leaves the DB layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scribe {
    pub id: ScribeId,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Uuid,
    pub content: String,
    pub visibility: Visibility,
    pub scribe_id: ScribeId,
    pub scribe_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Render a timestamp the way every API payload carries it: RFC 3339, UTC, `Z` suffix.
pub fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
