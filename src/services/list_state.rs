//! Session-local state for one emoji list.
//!
//! [`ListState`] is the authoritative in-memory copy of the list for the
//! current view-session, plus the transient UI state that travels with it
//! (which entry is being edited, which is being dragged, the search text).
//! All mutations are synchronous and local; persistence happens afterwards
//! in the session layer, which holds a [`Snapshot`] so it can revert the
//! specific mutation if the remote write fails.

use tracing::warn;

use crate::domain::EmojiEntry;

/// Copy of the entries taken before a mutation, used to roll it back.
#[derive(Debug, Clone)]
pub struct Snapshot(Vec<EmojiEntry>);

/// In-memory emoji list plus transient view state.
#[derive(Debug, Default)]
pub struct ListState {
    entries: Vec<EmojiEntry>,
    editing: Option<usize>,
    dragging: Option<usize>,
    query: String,
}

impl ListState {
    /// Creates an empty list state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list state holding the given entries.
    pub fn from_entries(entries: Vec<EmojiEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Returns the entries in list order.
    pub fn entries(&self) -> &[EmojiEntry] {
        &self.entries
    }

    /// Returns the entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&EmojiEntry> {
        self.entries.get(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the entries wholesale, e.g. from a fetch on mount.
    pub fn set_entries(&mut self, entries: Vec<EmojiEntry>) {
        self.entries = entries;
        self.editing = None;
        self.dragging = None;
    }

    /// Takes a pre-mutation snapshot for rollback.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.entries.clone())
    }

    /// Restores a previously taken snapshot, discarding later mutations.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.entries = snapshot.0;
        self.editing = None;
        self.dragging = None;
    }

    /// Appends a batch of entries in their given order.
    /// Returns how many entries were appended.
    pub fn insert_batch(&mut self, batch: Vec<EmojiEntry>) -> usize {
        let count = batch.len();
        self.entries.extend(batch);
        count
    }

    /// Removes the entry at `index`. Out-of-range is a logged no-op.
    pub fn remove(&mut self, index: usize) -> Option<EmojiEntry> {
        if index >= self.entries.len() {
            warn!(index, len = self.entries.len(), "remove index out of range");
            return None;
        }
        Some(self.entries.remove(index))
    }

    /// Moves the entry at `from` to position `to`: removed at the origin and
    /// re-inserted at the destination. Out-of-range is a logged no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.entries.len();
        if from >= len || to >= len {
            warn!(from, to, len, "reorder index out of range");
            return false;
        }
        if from == to {
            return false;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    /// Sets the display name of the entry at `index`.
    /// Out-of-range is a logged no-op.
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.name = name.into();
                true
            }
            None => {
                warn!(index, len = self.entries.len(), "rename index out of range");
                false
            }
        }
    }

    /// Current search text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sets the search text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// View projection: entries whose display name matches the search text,
    /// case-insensitively, paired with their original index. Never mutates
    /// the underlying list.
    pub fn filtered(&self) -> Vec<(usize, &EmojiEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(&self.query))
            .collect()
    }

    /// Index of the entry currently being edited, if any.
    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    /// Toggles edit mode for the entry at `index`: clicking the entry that
    /// is already being edited closes the editor.
    pub fn toggle_edit(&mut self, index: usize) {
        if self.editing == Some(index) {
            self.editing = None;
        } else if index < self.entries.len() {
            self.editing = Some(index);
        }
    }

    /// Clears the edit selection.
    pub fn clear_edit(&mut self) {
        self.editing = None;
    }

    /// Index of the entry currently being dragged, if any.
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Begins a drag gesture on the entry at `index`.
    pub fn drag_start(&mut self, index: usize) {
        if index < self.entries.len() {
            self.dragging = Some(index);
        }
    }

    /// The dragged entry hovers over `index`: the list is permuted live so
    /// the render tracks the gesture. Returns whether the order changed.
    pub fn drag_over(&mut self, index: usize) -> bool {
        let Some(from) = self.dragging else {
            return false;
        };
        if from == index {
            return false;
        }
        if self.reorder(from, index) {
            self.dragging = Some(index);
            true
        } else {
            false
        }
    }

    /// Ends the drag gesture. Returns whether a drag was in progress, in
    /// which case the resulting permutation must be persisted.
    pub fn drag_end(&mut self) -> bool {
        self.dragging.take().is_some()
    }

    /// Drops the dragged entry on the delete target, removing it.
    pub fn drop_on_delete(&mut self) -> Option<EmojiEntry> {
        let index = self.dragging.take()?;
        self.remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmojiToken;
    use pretty_assertions::assert_eq;

    fn entry(token: &str, name: &str) -> EmojiEntry {
        EmojiEntry::new(token.parse::<EmojiToken>().unwrap(), name)
    }

    fn three() -> ListState {
        ListState::from_entries(vec![
            entry("😀", "grin"),
            entry("1.gif", "dance"),
            entry("2.webp", "wave"),
        ])
    }

    #[test]
    fn drag_first_to_last_rotates_left() {
        let mut state = three();
        assert!(state.reorder(0, 2));
        let tokens: Vec<String> = state
            .entries()
            .iter()
            .map(|e| e.token.to_string())
            .collect();
        assert_eq!(tokens, vec!["1.gif", "2.webp", "😀"]);
    }

    #[test]
    fn reorder_round_trips() {
        let mut state = three();
        let original = state.entries().to_vec();
        assert!(state.reorder(0, 2));
        assert!(state.reorder(2, 0));
        assert_eq!(state.entries(), original.as_slice());
    }

    #[test]
    fn out_of_range_ops_are_noops() {
        let mut state = three();
        let original = state.entries().to_vec();
        assert!(state.remove(3).is_none());
        assert!(!state.reorder(0, 9));
        assert!(!state.rename(7, "x"));
        assert_eq!(state.entries(), original.as_slice());
    }

    #[test]
    fn remove_then_readd_restores_equivalent_list() {
        let mut state = three();
        let removed = state.remove(1).unwrap();
        state.insert_batch(vec![removed.clone()]);
        assert_eq!(state.len(), 3);
        assert_eq!(state.entries()[2], removed);
    }

    #[test]
    fn filter_is_case_insensitive_and_keeps_indices() {
        let mut state = three();
        state.set_query("AN");
        let hits: Vec<usize> = state.filtered().iter().map(|(i, _)| *i).collect();
        assert_eq!(hits, vec![1]);

        state.set_query("");
        assert_eq!(state.filtered().len(), 3);
    }

    #[test]
    fn filter_does_not_mutate() {
        let state = three();
        let before = state.entries().to_vec();
        let _ = state.filtered();
        assert_eq!(state.entries(), before.as_slice());
    }

    #[test]
    fn drag_gesture_permutes_live() {
        let mut state = three();
        state.drag_start(0);
        assert!(state.drag_over(1));
        assert!(state.drag_over(2));
        assert!(state.drag_end());
        let tokens: Vec<String> = state
            .entries()
            .iter()
            .map(|e| e.token.to_string())
            .collect();
        assert_eq!(tokens, vec!["1.gif", "2.webp", "😀"]);
        assert_eq!(state.dragging(), None);
    }

    #[test]
    fn drop_on_delete_removes_dragged_entry() {
        let mut state = three();
        state.drag_start(1);
        let removed = state.drop_on_delete().unwrap();
        assert_eq!(removed.name, "dance");
        assert_eq!(state.len(), 2);
        // No drag in progress afterwards.
        assert!(state.drop_on_delete().is_none());
    }

    #[test]
    fn toggle_edit_closes_on_second_click() {
        let mut state = three();
        state.toggle_edit(1);
        assert_eq!(state.editing(), Some(1));
        state.toggle_edit(1);
        assert_eq!(state.editing(), None);
    }

    #[test]
    fn snapshot_restores_previous_entries() {
        let mut state = three();
        let snap = state.snapshot();
        state.remove(0);
        state.rename(0, "changed");
        state.restore(snap);
        assert_eq!(state.len(), 3);
        assert_eq!(state.entries()[0].name, "grin");
    }
}
