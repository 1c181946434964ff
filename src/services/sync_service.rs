//! Remote synchronization of emoji lists.
//!
//! The [`DocumentStore`] trait is the narrow contract with the backing
//! document database: one list document per identity, fetched and replaced
//! wholesale. [`SyncService`] layers the session-level policies on top:
//! an absent document degrades to an empty list, whole-list replacement
//! refreshes a stale version token once, and append is a read-modify-write
//! guarded by the version token with bounded retry on conflict.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::{EmojiEntry, UserId};

/// Upper bound on append retries when losing version races.
const MAX_APPEND_ATTEMPTS: usize = 3;

/// Opaque optimistic-concurrency token for one stored list document.
///
/// The backend hands a fresh token back on every successful write; supplying
/// it on the next write detects concurrent modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    /// Returns the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A fetched list together with its version token.
#[derive(Debug, Clone)]
pub struct VersionedList {
    /// Entries in stored order.
    pub entries: Vec<EmojiEntry>,
    /// Version token of the document the entries were read from.
    pub version: Version,
}

/// Errors from the document store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No active identity for an operation that requires one.
    #[error("no active identity")]
    Unauthenticated,
    /// The supplied version token no longer matches the stored document.
    #[error("stored list was modified concurrently")]
    Conflict,
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The stored document could not be decoded.
    #[error("malformed stored document: {0}")]
    Decode(String),
    /// The backend rejected the request.
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Per-identity list document storage.
///
/// Every write is a single whole-field replacement; no operation partially
/// updates a list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the identity's list document. `None` when the document or its
    /// list field is absent, which is an empty state rather than an error.
    async fn fetch(&self, user: &UserId) -> Result<Option<VersionedList>, StoreError>;

    /// Overwrites the identity's entire list field. When `expected` is
    /// given and no longer matches the stored document, the write fails
    /// with [`StoreError::Conflict`]. Returns the new version token.
    /// Replaying the same entries produces the same stored state.
    async fn replace(
        &self,
        user: &UserId,
        entries: &[EmojiEntry],
        expected: Option<Version>,
    ) -> Result<Version, StoreError>;
}

/// Session-level sync policy over a [`DocumentStore`].
pub struct SyncService<S> {
    store: Arc<S>,
    public_user: UserId,
    /// Version token of the owned document, refreshed on every fetch/write.
    own_version: Mutex<Option<Version>>,
}

impl<S: DocumentStore> SyncService<S> {
    /// Creates a sync service over the given store. `public_user` is the
    /// fixed identity owning the shared public list.
    pub fn new(store: Arc<S>, public_user: UserId) -> Self {
        Self {
            store,
            public_user,
            own_version: Mutex::new(None),
        }
    }

    /// Fetches the identity's own list; an absent document or field is an
    /// empty list.
    pub async fn fetch_own(&self, user: &UserId) -> Result<Vec<EmojiEntry>, StoreError> {
        match self.store.fetch(user).await? {
            Some(list) => {
                *self.own_version.lock().await = Some(list.version);
                Ok(list.entries)
            }
            None => {
                *self.own_version.lock().await = None;
                Ok(Vec::new())
            }
        }
    }

    /// Fetches the shared public list under the same absent-is-empty rule.
    pub async fn fetch_public(&self) -> Result<Vec<EmojiEntry>, StoreError> {
        Ok(self
            .store
            .fetch(&self.public_user)
            .await?
            .map(|list| list.entries)
            .unwrap_or_default())
    }

    /// Replaces the identity's entire list. Used after reorder, delete and
    /// rename. A stale version token is refreshed once; the session is the
    /// assumed single writer, so its entries win.
    pub async fn replace(&self, user: &UserId, entries: &[EmojiEntry]) -> Result<(), StoreError> {
        let expected = self.own_version.lock().await.clone();
        match self.store.replace(user, entries, expected).await {
            Ok(version) => {
                *self.own_version.lock().await = Some(version);
                Ok(())
            }
            Err(StoreError::Conflict) => {
                warn!("stale version token on replace, refreshing");
                let refreshed = self
                    .store
                    .fetch(user)
                    .await?
                    .map(|list| list.version);
                let version = self.store.replace(user, entries, refreshed).await?;
                *self.own_version.lock().await = Some(version);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Appends entries to the identity's stored list: read-modify-write
    /// guarded by the version token, retried a bounded number of times when
    /// a concurrent writer wins the race. Returns the merged list as stored.
    pub async fn append(
        &self,
        user: &UserId,
        new_entries: &[EmojiEntry],
    ) -> Result<Vec<EmojiEntry>, StoreError> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let (mut entries, version) = match self.store.fetch(user).await? {
                Some(list) => (list.entries, Some(list.version)),
                None => (Vec::new(), None),
            };
            entries.extend_from_slice(new_entries);

            match self.store.replace(user, &entries, version).await {
                Ok(version) => {
                    *self.own_version.lock().await = Some(version);
                    return Ok(entries);
                }
                Err(StoreError::Conflict) => {
                    warn!(attempt, "append lost a version race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmojiToken;
    use pretty_assertions::assert_eq;

    fn entry(token: &str) -> EmojiEntry {
        EmojiEntry::unnamed(token.parse::<EmojiToken>().unwrap())
    }

    fn versioned(tokens: &[&str], version: &str) -> VersionedList {
        VersionedList {
            entries: tokens.iter().map(|t| entry(t)).collect(),
            version: Version::from(version.to_string()),
        }
    }

    #[tokio::test]
    async fn absent_document_is_an_empty_list() {
        let mut store = MockDocumentStore::new();
        store.expect_fetch().times(1).returning(|_| Ok(None));

        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        let entries = sync.fetch_own(&UserId::from("u1")).await.unwrap();
        assert_eq!(entries, vec![]);
    }

    #[tokio::test]
    async fn fetch_public_reads_the_fixed_identity() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch()
            .withf(|user| user.as_str() == "public")
            .times(1)
            .returning(|_| Ok(Some(versioned(&["😀"], "v1"))));

        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        let entries = sync.fetch_public().await.unwrap();
        assert_eq!(entries, vec![entry("😀")]);
    }

    #[tokio::test]
    async fn replace_passes_the_cached_version_token() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(versioned(&["😀"], "v1"))));
        store
            .expect_replace()
            .withf(|_, entries, expected| {
                entries.len() == 1 && expected.as_ref().map(Version::as_str) == Some("v1")
            })
            .times(1)
            .returning(|_, _, _| Ok(Version::from("v2".to_string())));

        let user = UserId::from("u1");
        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        sync.fetch_own(&user).await.unwrap();
        sync.replace(&user, &[entry("😀")]).await.unwrap();
    }

    #[tokio::test]
    async fn replace_refreshes_a_stale_token_once() {
        let mut store = MockDocumentStore::new();
        store
            .expect_replace()
            .withf(|_, _, expected| expected.is_none())
            .times(1)
            .returning(|_, _, _| Err(StoreError::Conflict));
        store
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(versioned(&["😀"], "v7"))));
        store
            .expect_replace()
            .withf(|_, _, expected| expected.as_ref().map(Version::as_str) == Some("v7"))
            .times(1)
            .returning(|_, _, _| Ok(Version::from("v8".to_string())));

        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        sync.replace(&UserId::from("u1"), &[entry("1.gif")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_merges_with_the_stored_list() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(versioned(&["😀"], "v1"))));
        store
            .expect_replace()
            .withf(|_, entries, expected| {
                entries.len() == 2
                    && entries[1].token.to_string() == "2.webp"
                    && expected.as_ref().map(Version::as_str) == Some("v1")
            })
            .times(1)
            .returning(|_, _, _| Ok(Version::from("v2".to_string())));

        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        let merged = sync
            .append(&UserId::from("u1"), &[entry("2.webp")])
            .await
            .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn append_retries_on_conflict_then_gives_up() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch()
            .times(MAX_APPEND_ATTEMPTS)
            .returning(|_| Ok(Some(versioned(&["😀"], "v1"))));
        store
            .expect_replace()
            .times(MAX_APPEND_ATTEMPTS)
            .returning(|_, _, _| Err(StoreError::Conflict));

        let sync = SyncService::new(Arc::new(store), UserId::from("public"));
        let err = sync
            .append(&UserId::from("u1"), &[entry("2.webp")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }
}
