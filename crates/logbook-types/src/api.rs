use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Entry, Scribe, ScribeId, iso8601};

// -- JSON:API envelopes --

/// Top-level success document: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T> Document<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A single resource object.
#[derive(Debug, Serialize)]
pub struct Resource<A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub attributes: A,
}

/// Top-level error document: `{ "errors": [...] }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub status: String,
    pub title: String,
    pub detail: String,
}

// -- Scribes --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScribeAttributes {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub type ScribeResource = Resource<ScribeAttributes>;

impl From<&Scribe> for ScribeResource {
    fn from(scribe: &Scribe) -> Self {
        Resource {
            kind: "scribes",
            id: scribe.id.to_string(),
            attributes: ScribeAttributes {
                username: scribe.username.clone(),
                email: scribe.email.clone(),
                bio: scribe.bio.clone(),
                created_at: iso8601(&scribe.created_at),
                updated_at: iso8601(&scribe.updated_at),
            },
        }
    }
}

// -- Entries --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAttributes {
    pub content: String,
    pub visibility: String,
    pub created_at: String,
    pub updated_at: String,
    pub scribe_id: ScribeId,
    pub scribe_username: String,
}

pub type EntryResource = Resource<EntryAttributes>;

impl From<&Entry> for EntryResource {
    fn from(entry: &Entry) -> Self {
        Resource {
            kind: "entries",
            id: entry.id.to_string(),
            attributes: EntryAttributes {
                content: entry.content.clone(),
                visibility: entry.visibility.to_string(),
                created_at: iso8601(&entry.created_at),
                updated_at: iso8601(&entry.updated_at),
                scribe_id: entry.scribe_id,
                scribe_username: entry.scribe_username.clone(),
            },
        }
    }
}

// -- Service metadata --

#[derive(Debug, Serialize)]
pub struct ApiInfoAttributes {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthAttributes {
    pub status: &'static str,
}

// -- Requests --
//
// Unknown keys in request bodies are ignored.

#[derive(Debug, Deserialize)]
pub struct EnlistRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Partial profile update. `bio: null` clears the bio, an absent `bio` leaves it alone.
#[derive(Debug, Default, Deserialize)]
pub struct AmendScribeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Visibility travels as a raw string so an unknown literal can be reported
/// as such instead of as a generic decoding failure. `Some(None)` is an
/// explicit `null`, which is not a visibility.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub content: String,
    #[serde(default, deserialize_with = "present")]
    pub visibility: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub visibility: Option<Option<String>>,
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visibility;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn amend_distinguishes_null_bio_from_absent_bio() {
        let cleared: AmendScribeRequest = serde_json::from_value(json!({ "bio": null })).unwrap();
        assert_eq!(cleared.bio, Some(None));

        let untouched: AmendScribeRequest =
            serde_json::from_value(json!({ "email": "a@example.com" })).unwrap();
        assert_eq!(untouched.bio, None);
        assert_eq!(untouched.email.as_deref(), Some("a@example.com"));

        let set: AmendScribeRequest = serde_json::from_value(json!({ "bio": "hi" })).unwrap();
        assert_eq!(set.bio, Some(Some("hi".to_string())));
    }

    #[test]
    fn entry_requests_keep_a_null_visibility_apart_from_a_missing_one() {
        let missing: CreateEntryRequest = serde_json::from_value(json!({ "content": "x" })).unwrap();
        assert_eq!(missing.visibility, None);

        let null: CreateEntryRequest =
            serde_json::from_value(json!({ "content": "x", "visibility": null })).unwrap();
        assert_eq!(null.visibility, Some(None));

        let update: UpdateEntryRequest =
            serde_json::from_value(json!({ "visibility": "private" })).unwrap();
        assert_eq!(update.visibility, Some(Some("private".to_string())));
    }

    #[test]
    fn scribe_resource_never_carries_credentials() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let scribe = Scribe {
            id: 7,
            username: "alice".into(),
            email: "alice@example.com".into(),
            bio: None,
            created_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(Document::new(ScribeResource::from(&scribe))).unwrap();
        assert_eq!(value["data"]["type"], "scribes");
        assert_eq!(value["data"]["id"], "7");
        assert_eq!(value["data"]["attributes"]["bio"], serde_json::Value::Null);
        assert_eq!(value["data"]["attributes"]["createdAt"], "2024-01-02T03:04:05.000000Z");

        let attributes = value["data"]["attributes"].as_object().unwrap();
        assert!(!attributes.keys().any(|k| k.to_lowercase().contains("password")));
    }

    #[test]
    fn entry_resource_uses_camel_case_attributes() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = Uuid::new_v4();
        let entry = Entry {
            id,
            content: "first light".into(),
            visibility: Visibility::Private,
            scribe_id: 3,
            scribe_username: "bob".into(),
            created_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(EntryResource::from(&entry)).unwrap();
        assert_eq!(value["type"], "entries");
        assert_eq!(value["id"], id.to_string());
        assert_eq!(value["attributes"]["visibility"], "private");
        assert_eq!(value["attributes"]["scribeId"], 3);
        assert_eq!(value["attributes"]["scribeUsername"], "bob");
    }
}
