//! Session services: list state, input parsing, remote sync, notifications,
//! preferences, and the clipboard seam.

pub mod clipboard;
pub mod list_state;
pub mod notifier;
pub mod parser;
pub mod prefs;
pub mod sync_service;

pub use clipboard::{ClipboardSink, StdoutClipboard};
pub use list_state::{ListState, Snapshot};
pub use notifier::{Notification, Notifier};
pub use parser::{parse_submission, CdnProbe};
pub use prefs::Preferences;
pub use sync_service::{DocumentStore, StoreError, SyncService, Version, VersionedList};
