//! Firestore REST implementation of the document store.
//!
//! One document per identity at `userdata/<uid>`, holding the ordered list
//! in an `emojis` array field of `{token, name}` maps. Writes PATCH the
//! whole field with an update mask; the document's `updateTime` doubles as
//! the optimistic-concurrency token via a `currentDocument.updateTime`
//! precondition.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::{EmojiEntry, EmojiToken, UserId};
use crate::services::{DocumentStore, StoreError, Version, VersionedList};

/// Default Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Supplies the bearer token for document-store requests.
pub trait TokenSource: Send + Sync {
    /// The current identity's ID token, if signed in.
    fn id_token(&self) -> Option<String>;
}

/// Firestore-backed [`DocumentStore`].
pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl FirestoreStore {
    /// Creates a store for the given project, authenticating requests with
    /// tokens from `tokens`.
    pub fn new(
        http: reqwest::Client,
        project_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// Overrides the API endpoint, e.g. for the Firestore emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn document_url(&self, user: &UserId) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/userdata/{}",
            self.base_url, self.project_id, user
        )
    }

    fn bearer(&self) -> Result<String, StoreError> {
        self.tokens.id_token().ok_or(StoreError::Unauthenticated)
    }
}

/// Decodes a Firestore document into its entries (or `None` when the
/// `emojis` field is absent) plus the `updateTime` version token.
fn decode_document(doc: &Value) -> Result<(Option<Vec<EmojiEntry>>, Version), StoreError> {
    let update_time = doc
        .get("updateTime")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("document missing updateTime".to_string()))?;
    let version = Version::from(update_time.to_string());

    let Some(array) = doc.pointer("/fields/emojis/arrayValue") else {
        return Ok((None, version));
    };
    // Firestore omits `values` entirely for an empty array.
    let values = array
        .get("values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut entries = Vec::with_capacity(values.len());
    for value in &values {
        match decode_entry(value) {
            Some(entry) => entries.push(entry),
            None => warn!(%value, "skipping invalid stored emoji entry"),
        }
    }
    Ok((Some(entries), version))
}

fn decode_entry(value: &Value) -> Option<EmojiEntry> {
    let fields = value.pointer("/mapValue/fields")?;
    let token = fields.pointer("/token/stringValue")?.as_str()?;
    let name = fields
        .pointer("/name/stringValue")
        .and_then(Value::as_str)
        .unwrap_or("");
    let token: EmojiToken = token.parse().ok()?;
    Some(EmojiEntry::new(token, name))
}

/// Encodes entries as the `emojis` array field value.
fn encode_entries(entries: &[EmojiEntry]) -> Value {
    let values: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "mapValue": {
                    "fields": {
                        "token": { "stringValue": entry.token.to_string() },
                        "name": { "stringValue": entry.name },
                    }
                }
            })
        })
        .collect();
    json!({ "arrayValue": { "values": values } })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn fetch(&self, user: &UserId) -> Result<Option<VersionedList>, StoreError> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.document_url(user))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected(format!("{status}: {body}")));
        }

        let doc: Value = response.json().await?;
        let (entries, version) = decode_document(&doc)?;
        Ok(entries.map(|entries| VersionedList { entries, version }))
    }

    async fn replace(
        &self,
        user: &UserId,
        entries: &[EmojiEntry],
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let token = self.bearer()?;
        let mut request = self
            .http
            .patch(self.document_url(user))
            .query(&[("updateMask.fieldPaths", "emojis")])
            .bearer_auth(token)
            .json(&json!({ "fields": { "emojis": encode_entries(entries) } }));
        if let Some(expected) = &expected {
            request = request.query(&[("currentDocument.updateTime", expected.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(StoreError::Conflict);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The REST API reports a failed updateTime precondition as a
            // FAILED_PRECONDITION error.
            if body.contains("FAILED_PRECONDITION") {
                return Err(StoreError::Conflict);
            }
            return Err(StoreError::Rejected(format!("{status}: {body}")));
        }

        let doc: Value = response.json().await?;
        let update_time = doc
            .get("updateTime")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("write response missing updateTime".to_string()))?;
        Ok(Version::from(update_time.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(emojis: Option<Value>) -> Value {
        let mut fields = json!({});
        if let Some(emojis) = emojis {
            fields["emojis"] = emojis;
        }
        json!({
            "name": "projects/p/databases/(default)/documents/userdata/u1",
            "fields": fields,
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-06-01T12:00:00Z",
        })
    }

    #[test]
    fn decodes_entries_and_version() {
        let doc = document(Some(json!({
            "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "token": { "stringValue": "😀" },
                    "name": { "stringValue": "" },
                }}},
                { "mapValue": { "fields": {
                    "token": { "stringValue": "42.gif" },
                    "name": { "stringValue": "dance" },
                }}},
            ]}
        })));

        let (entries, version) = decode_document(&doc).unwrap();
        let entries = entries.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].token.to_string(), "42.gif");
        assert_eq!(entries[1].name, "dance");
        assert_eq!(version.as_str(), "2024-06-01T12:00:00Z");
    }

    #[test]
    fn absent_list_field_decodes_as_none() {
        let doc = document(None);
        let (entries, _) = decode_document(&doc).unwrap();
        assert!(entries.is_none());
    }

    #[test]
    fn empty_array_value_decodes_as_empty_list() {
        let doc = document(Some(json!({ "arrayValue": {} })));
        let (entries, _) = decode_document(&doc).unwrap();
        assert_eq!(entries.unwrap(), vec![]);
    }

    #[test]
    fn invalid_stored_entries_are_skipped() {
        let doc = document(Some(json!({
            "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "token": { "stringValue": "not-a-token" },
                }}},
                { "mapValue": { "fields": {
                    "token": { "stringValue": "😀" },
                }}},
            ]}
        })));

        let (entries, _) = decode_document(&doc).unwrap();
        let entries = entries.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].token.to_string(), "😀");
    }

    #[test]
    fn missing_update_time_is_a_decode_error() {
        let err = decode_document(&json!({ "fields": {} })).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let entries = vec![
            EmojiEntry::new("😀".parse::<EmojiToken>().unwrap(), ""),
            EmojiEntry::new("42.webp".parse::<EmojiToken>().unwrap(), "Thumbs Up"),
        ];
        let doc = json!({
            "fields": { "emojis": encode_entries(&entries) },
            "updateTime": "2024-06-01T12:00:00Z",
        });

        let (decoded, _) = decode_document(&doc).unwrap();
        assert_eq!(decoded.unwrap(), entries);
    }
}
