use chrono::{SecondsFormat, Utc};
use logbook_types::models::{ScribeId, Visibility};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{EntryRow, ScribeRow};
use crate::{Database, Result};

/// Fields a profile amendment may touch. `None` leaves the column alone.
#[derive(Debug, Default)]
pub struct ScribeChanges<'a> {
    pub email: Option<&'a str>,
    pub bio: Option<Option<&'a str>>,
    pub password_hash: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct EntryChanges<'a> {
    pub content: Option<&'a str>,
    pub visibility: Option<Visibility>,
}

impl Database {
    // -- Scribes --

    /// Insert a new scribe. A duplicate username or email surfaces as
    /// [`crate::DbError::UniqueViolation`] straight from the constraint.
    pub fn create_scribe(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        bio: Option<&str>,
    ) -> Result<ScribeRow> {
        self.with_conn_mut(|conn| {
            let now = now();
            conn.execute(
                "INSERT INTO scribes (username, email, password_hash, bio, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![username, email, password_hash, bio, now],
            )?;
            let id = conn.last_insert_rowid();

            Ok(ScribeRow {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                bio: bio.map(str::to_string),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    pub fn get_scribe(&self, id: ScribeId) -> Result<Option<ScribeRow>> {
        self.with_conn(|conn| query_scribe(conn, "id = ?1", params![id]))
    }

    pub fn get_scribe_by_username(&self, username: &str) -> Result<Option<ScribeRow>> {
        self.with_conn(|conn| query_scribe(conn, "username = ?1", params![username]))
    }

    pub fn get_scribe_by_email(&self, email: &str) -> Result<Option<ScribeRow>> {
        self.with_conn(|conn| query_scribe(conn, "email = ?1", params![email]))
    }

    /// Apply `changes` and bump `updated_at`. Returns `None` if the scribe is gone.
    pub fn amend_scribe(&self, id: ScribeId, changes: ScribeChanges<'_>) -> Result<Option<ScribeRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut row) = query_scribe(&tx, "id = ?1", params![id])? else {
                return Ok(None);
            };

            if let Some(email) = changes.email {
                row.email = email.to_string();
            }
            if let Some(bio) = changes.bio {
                row.bio = bio.map(str::to_string);
            }
            if let Some(hash) = changes.password_hash {
                row.password_hash = hash.to_string();
            }
            row.updated_at = now();

            tx.execute(
                "UPDATE scribes SET email = ?1, bio = ?2, password_hash = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![row.email, row.bio, row.password_hash, row.updated_at, id],
            )?;
            tx.commit()?;

            Ok(Some(row))
        })
    }

    /// Delete a scribe together with every entry they own, atomically.
    /// Returns the number of entries removed, or `None` if the scribe did not exist.
    pub fn retire_scribe(&self, id: ScribeId) -> Result<Option<usize>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let entries = tx.execute("DELETE FROM entries WHERE scribe_id = ?1", [id])?;
            let scribes = tx.execute("DELETE FROM scribes WHERE id = ?1", [id])?;
            if scribes == 0 {
                // Nothing to retire; dropping the transaction rolls back.
                return Ok(None);
            }

            tx.commit()?;
            Ok(Some(entries))
        })
    }

    // -- Entries --

    pub fn create_entry(
        &self,
        id: &str,
        scribe_id: ScribeId,
        content: &str,
        visibility: Visibility,
    ) -> Result<EntryRow> {
        self.with_conn_mut(|conn| {
            let now = now();
            conn.execute(
                "INSERT INTO entries (id, content, visibility, scribe_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id, content, visibility.as_str(), scribe_id, now],
            )?;

            query_entry(conn, id)?.ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
        })
    }

    pub fn get_entry(&self, id: &str) -> Result<Option<EntryRow>> {
        self.with_conn(|conn| query_entry(conn, id))
    }

    /// Apply `changes` and bump `updated_at`. Returns `None` if the entry is gone.
    pub fn update_entry(&self, id: &str, changes: EntryChanges<'_>) -> Result<Option<EntryRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut row) = query_entry(&tx, id)? else {
                return Ok(None);
            };

            if let Some(content) = changes.content {
                row.content = content.to_string();
            }
            if let Some(visibility) = changes.visibility {
                row.visibility = visibility.as_str().to_string();
            }
            row.updated_at = now();

            tx.execute(
                "UPDATE entries SET content = ?1, visibility = ?2, updated_at = ?3 WHERE id = ?4",
                params![row.content, row.visibility, row.updated_at, id],
            )?;
            tx.commit()?;

            Ok(Some(row))
        })
    }

    /// Returns whether a row was deleted.
    pub fn delete_entry(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Every entry owned by `scribe_id`, newest first.
    pub fn chronicle(&self, scribe_id: ScribeId) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ENTRY_SELECT} WHERE e.scribe_id = ?1 ORDER BY e.created_at DESC, e.rowid DESC"
            ))?;

            let rows = stmt
                .query_map([scribe_id], map_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// Entries always come back with their owner's username (single JOIN, no N+1).
const ENTRY_SELECT: &str = "SELECT e.id, e.content, e.visibility, e.scribe_id, s.username,
        e.created_at, e.updated_at
     FROM entries e
     JOIN scribes s ON s.id = e.scribe_id";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_scribe(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Option<ScribeRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password_hash, bio, created_at, updated_at
         FROM scribes WHERE {filter}"
    ))?;

    let row = stmt
        .query_row(params, |row| {
            Ok(ScribeRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                bio: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_entry(conn: &Connection, id: &str) -> Result<Option<EntryRow>> {
    let mut stmt = conn.prepare(&format!("{ENTRY_SELECT} WHERE e.id = ?1"))?;
    let row = stmt.query_row([id], map_entry).optional()?;
    Ok(row)
}

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        content: row.get(1)?,
        visibility: row.get(2)?,
        scribe_id: row.get(3)?,
        scribe_username: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DbError, UniqueField};
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn scribe(db: &Database, name: &str) -> ScribeRow {
        db.create_scribe(name, &format!("{name}@example.com"), "hash", None)
            .unwrap()
    }

    fn entry(db: &Database, owner: ScribeId, content: &str) -> EntryRow {
        let id = Uuid::new_v4().to_string();
        db.create_entry(&id, owner, content, Visibility::Public).unwrap()
    }

    #[test]
    fn duplicate_username_is_rejected_by_the_constraint() {
        let db = db();
        let alice = scribe(&db, "alice");

        let err = db
            .create_scribe("alice", "other@example.com", "hash", None)
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(UniqueField::Username)));

        let still_there = db.get_scribe_by_username("alice").unwrap().unwrap();
        assert_eq!(still_there.id, alice.id);
        assert_eq!(still_there.email, "alice@example.com");
    }

    #[test]
    fn duplicate_email_is_rejected_by_the_constraint() {
        let db = db();
        scribe(&db, "alice");

        let err = db
            .create_scribe("alicia", "alice@example.com", "hash", None)
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(UniqueField::Email)));
        assert!(db.get_scribe_by_username("alicia").unwrap().is_none());
    }

    #[test]
    fn amending_to_a_taken_email_leaves_the_row_untouched() {
        let db = db();
        let alice = scribe(&db, "alice");
        scribe(&db, "bob");

        let err = db
            .amend_scribe(
                alice.id,
                ScribeChanges {
                    email: Some("bob@example.com"),
                    bio: Some(Some("new bio")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(UniqueField::Email)));

        let row = db.get_scribe(alice.id).unwrap().unwrap();
        assert_eq!(row.email, "alice@example.com");
        assert_eq!(row.bio, None);
    }

    #[test]
    fn amend_can_clear_bio() {
        let db = db();
        let row = db
            .create_scribe("alice", "alice@example.com", "hash", Some("hello"))
            .unwrap();

        let amended = db
            .amend_scribe(
                row.id,
                ScribeChanges {
                    bio: Some(None),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(amended.bio, None);
        assert_eq!(amended.email, "alice@example.com");
        assert!(amended.updated_at >= row.updated_at);
    }

    #[test]
    fn amend_missing_scribe_is_none() {
        assert!(db().amend_scribe(42, ScribeChanges::default()).unwrap().is_none());
    }

    #[test]
    fn retire_removes_scribe_and_all_entries() {
        let db = db();
        let alice = scribe(&db, "alice");
        let bob = scribe(&db, "bob");
        let e1 = entry(&db, alice.id, "one");
        let e2 = entry(&db, alice.id, "two");
        let kept = entry(&db, bob.id, "bob's");

        assert_eq!(db.retire_scribe(alice.id).unwrap(), Some(2));

        assert!(db.get_scribe(alice.id).unwrap().is_none());
        assert!(db.get_entry(&e1.id).unwrap().is_none());
        assert!(db.get_entry(&e2.id).unwrap().is_none());
        assert!(db.get_entry(&kept.id).unwrap().is_some());
    }

    #[test]
    fn retire_unknown_scribe_is_none() {
        assert_eq!(db().retire_scribe(99).unwrap(), None);
    }

    #[test]
    fn foreign_key_cascade_backs_up_the_explicit_delete() {
        let db = db();
        let alice = scribe(&db, "alice");
        let e = entry(&db, alice.id, "orphan?");

        db.with_conn(|conn| {
            conn.execute("DELETE FROM scribes WHERE id = ?1", [alice.id])?;
            Ok(())
        })
        .unwrap();

        assert!(db.get_entry(&e.id).unwrap().is_none());
    }

    #[test]
    fn entry_requires_an_existing_owner() {
        let db = db();
        let id = Uuid::new_v4().to_string();
        assert!(db.create_entry(&id, 12345, "nobody", Visibility::Public).is_err());
    }

    #[test]
    fn visibility_outside_the_two_literals_is_refused_by_storage() {
        let db = db();
        let alice = scribe(&db, "alice");
        let result = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO entries (id, content, visibility, scribe_id, created_at, updated_at)
                 VALUES ('x', 'c', 'friends', ?1, 'now', 'now')",
                [alice.id],
            )?;
            Ok(())
        });
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn chronicle_is_newest_first_and_owner_only() {
        let db = db();
        let alice = scribe(&db, "alice");
        let bob = scribe(&db, "bob");

        let first = entry(&db, alice.id, "first");
        let second = entry(&db, alice.id, "second");
        entry(&db, bob.id, "not alice's");
        let third = entry(&db, alice.id, "third");

        let ids: Vec<String> = db
            .chronicle(alice.id)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn update_entry_changes_only_given_fields() {
        let db = db();
        let alice = scribe(&db, "alice");
        let e = entry(&db, alice.id, "draft");

        let updated = db
            .update_entry(
                &e.id,
                EntryChanges {
                    visibility: Some(Visibility::Private),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "draft");
        assert_eq!(updated.visibility, "private");
        assert_eq!(updated.scribe_username, "alice");
        assert_eq!(updated.created_at, e.created_at);
    }

    #[test]
    fn delete_entry_reports_whether_anything_went() {
        let db = db();
        let alice = scribe(&db, "alice");
        let e = entry(&db, alice.id, "gone soon");

        assert!(db.delete_entry(&e.id).unwrap());
        assert!(!db.delete_entry(&e.id).unwrap());
    }
}
