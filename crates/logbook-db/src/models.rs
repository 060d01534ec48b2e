//! Database row types. These map directly to SQLite rows and stay separate from
//! the logbook-types models so the DB layer can evolve on its own.

use chrono::{DateTime, NaiveDateTime, Utc};
use logbook_types::models::{Entry, Scribe, ScribeId, Visibility};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScribeRow {
    pub id: ScribeId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct EntryRow {
    pub id: String,
    pub content: String,
    pub visibility: String,
    pub scribe_id: ScribeId,
    pub scribe_username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ScribeRow {
    pub fn to_scribe(&self) -> Scribe {
        Scribe {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

impl EntryRow {
    pub fn to_entry(&self) -> Entry {
        let id = self.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt entry id '{}': {}", self.id, e);
            Uuid::nil()
        });

        // Anything we cannot classify is treated as private so only the owner sees it.
        let visibility = self.visibility.parse().unwrap_or_else(|e| {
            warn!("Entry '{}': {}; treating as private", self.id, e);
            Visibility::Private
        });

        Entry {
            id,
            content: self.content.clone(),
            visibility,
            scribe_id: self.scribe_id,
            scribe_username: self.scribe_username.clone(),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

/// Timestamps are written as RFC 3339. Rows touched by hand in the sqlite shell
/// may carry SQLite's own `YYYY-MM-DD HH:MM:SS` instead, read as naive UTC.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}
