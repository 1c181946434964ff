//! Session orchestration.
//!
//! A [`Session`] ties one signed-in identity's view-session together: the
//! owned and public list states, the sync service, the CDN probe used by
//! the add parser, the notification queue, and the event bus. Mutations
//! apply to local state synchronously; the corresponding remote write is
//! awaited by these methods, but callers are free to spawn them and keep
//! rendering — the local state is already updated when the method starts
//! waiting. A failed remote write reverts the specific local mutation and
//! surfaces a notification.

pub mod events;

pub use events::{AppEvent, EventBus};

use std::sync::Arc;

use tracing::{error, warn};

use crate::config::Config;
use crate::domain::UserId;
use crate::services::{
    parse_submission, CdnProbe, ClipboardSink, DocumentStore, ListState, Notifier, Snapshot,
    StoreError, SyncService,
};

/// One signed-in view-session over the emoji deck.
pub struct Session<S> {
    user: UserId,
    own: ListState,
    public: ListState,
    sync: SyncService<S>,
    probe: Arc<dyn CdnProbe>,
    notifier: Notifier,
    events: EventBus,
    cdn_host: String,
    copy_size: u32,
    drag_snapshot: Option<Snapshot>,
}

impl<S: DocumentStore> Session<S> {
    /// Creates a session for `user` over the given store and CDN probe.
    pub fn new(user: UserId, store: Arc<S>, probe: Arc<dyn CdnProbe>, config: &Config) -> Self {
        Self {
            user,
            own: ListState::new(),
            public: ListState::new(),
            sync: SyncService::new(store, UserId::from(config.public_list_user.as_str())),
            probe,
            notifier: Notifier::new(),
            events: EventBus::default(),
            cdn_host: config.cdn_host.clone(),
            copy_size: config.copy_size,
            drag_snapshot: None,
        }
    }

    /// The owned list state.
    pub fn own(&self) -> &ListState {
        &self.own
    }

    /// The shared public list state. This session only ever reads it.
    pub fn public(&self) -> &ListState {
        &self.public
    }

    /// Pending notification messages, pruned of expired ones.
    pub fn notifications(&mut self) -> Vec<String> {
        self.notifier
            .active()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    /// The session event bus, for subscribing renders and inputs.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Fetches both lists, as on component mount. An absent document is an
    /// empty list; transport failures propagate.
    pub async fn mount(&mut self) -> Result<(), StoreError> {
        let own = self.sync.fetch_own(&self.user).await?;
        self.own.set_entries(own);
        let public = self.sync.fetch_public().await?;
        self.public.set_entries(public);
        self.events.emit(AppEvent::ListReplaced);
        Ok(())
    }

    /// Parses one add-submission and appends the resulting entries as a
    /// batch, locally first and then remotely. Returns whether at least one
    /// entry was produced, which is also the signal to clear the input
    /// field (emitted as [`AppEvent::InputCleared`]).
    pub async fn add_from_input(&mut self, input: &str) -> bool {
        let batch = parse_submission(input, self.probe.as_ref()).await;
        if batch.is_empty() {
            return false;
        }

        let snapshot = self.own.snapshot();
        self.own.insert_batch(batch.clone());
        self.events.emit(AppEvent::InputCleared);

        match self.sync.append(&self.user, &batch).await {
            Ok(merged) => {
                // The store may have merged concurrent additions.
                self.own.set_entries(merged);
                self.saved();
            }
            Err(err) => self.revert("adding emoji failed", snapshot, err),
        }
        true
    }

    /// Removes the entry at `index` and persists the shortened list.
    /// Out-of-range is a logged no-op.
    pub async fn remove(&mut self, index: usize) -> bool {
        let snapshot = self.own.snapshot();
        if self.own.remove(index).is_none() {
            return false;
        }
        self.persist_replace("removing emoji failed", snapshot).await;
        true
    }

    /// Moves the entry at `from` to `to` and persists the permutation.
    pub async fn reorder(&mut self, from: usize, to: usize) -> bool {
        let snapshot = self.own.snapshot();
        if !self.own.reorder(from, to) {
            return false;
        }
        self.persist_replace("reordering emoji failed", snapshot)
            .await;
        true
    }

    /// Renames the entry at `index` and persists the change.
    pub async fn rename(&mut self, index: usize, name: &str) -> bool {
        let snapshot = self.own.snapshot();
        if !self.own.rename(index, name) {
            return false;
        }
        self.persist_replace("renaming emoji failed", snapshot).await;
        true
    }

    /// Begins a drag gesture on the owned list.
    pub fn drag_start(&mut self, index: usize) {
        self.drag_snapshot = Some(self.own.snapshot());
        self.own.drag_start(index);
    }

    /// Live-permutes while the drag hovers over `index`.
    pub fn drag_over(&mut self, index: usize) {
        self.own.drag_over(index);
    }

    /// Drops the drag, persisting the resulting permutation.
    pub async fn drag_end(&mut self) {
        let snapshot = self.drag_snapshot.take();
        if !self.own.drag_end() {
            return;
        }
        let snapshot = snapshot.unwrap_or_else(|| self.own.snapshot());
        self.persist_replace("reordering emoji failed", snapshot)
            .await;
    }

    /// Drops the dragged entry on the delete target and persists the
    /// shortened list.
    pub async fn drop_on_delete(&mut self) -> bool {
        let snapshot = self
            .drag_snapshot
            .take()
            .unwrap_or_else(|| self.own.snapshot());
        if self.own.drop_on_delete().is_none() {
            return false;
        }
        self.persist_replace("removing emoji failed", snapshot).await;
        true
    }

    /// Toggles the edit selection on the owned list.
    pub fn toggle_edit(&mut self, index: usize) {
        self.own.toggle_edit(index);
    }

    /// Sets the search text, applied independently to both lists.
    pub fn set_query(&mut self, query: &str) {
        self.own.set_query(query);
        self.public.set_query(query);
    }

    /// Copies the owned entry at `index` to the clipboard sink.
    pub fn copy(&mut self, index: usize, sink: &dyn ClipboardSink) -> bool {
        let Some(entry) = self.own.get(index) else {
            warn!(index, "copy index out of range");
            return false;
        };
        let payload = entry.token.copy_payload(&self.cdn_host, self.copy_size);
        self.finish_copy(payload, sink);
        true
    }

    /// Copies the public entry at `index` to the clipboard sink.
    pub fn copy_public(&mut self, index: usize, sink: &dyn ClipboardSink) -> bool {
        let Some(entry) = self.public.get(index) else {
            warn!(index, "copy index out of range");
            return false;
        };
        let payload = entry.token.copy_payload(&self.cdn_host, self.copy_size);
        self.finish_copy(payload, sink);
        true
    }

    fn finish_copy(&mut self, payload: String, sink: &dyn ClipboardSink) {
        sink.write_text(&payload);
        self.notifier.push("Copied to clipboard!");
        self.events.emit(AppEvent::Copied);
    }

    async fn persist_replace(&mut self, what: &str, snapshot: Snapshot) {
        match self.sync.replace(&self.user, self.own.entries()).await {
            Ok(()) => self.saved(),
            Err(err) => self.revert(what, snapshot, err),
        }
    }

    fn saved(&mut self) {
        self.notifier.push("Saved");
        self.events.emit(AppEvent::Saved);
    }

    fn revert(&mut self, what: &str, snapshot: Snapshot, err: StoreError) {
        error!(%err, "{what}, reverting local change");
        self.own.restore(snapshot);
        self.notifier.push("Couldn't save, change undone");
        self.events.emit(AppEvent::ListReplaced);
    }
}
