//! emoji-deck: a personal emoji deck.
//!
//! Users curate an ordered list of emoji references — literal system emoji
//! or Discord-hosted custom emoji images — reorder them by dragging, name
//! them for search, and copy them for reuse in chat apps. Lists live in a
//! per-identity document in a remote store; a fixed identity's list is
//! shared read-only with everyone.
//!
//! The crate is organized as:
//! - [`domain`]: the core types and their persisted string forms
//! - [`services`]: list state, input parsing, sync, notifications,
//!   preferences, and the clipboard seam
//! - [`app`]: the per-session orchestrator and event bus
//! - [`remote`]: reqwest-backed adapters for the store, identity provider,
//!   and CDN probe

pub mod app;
pub mod config;
pub mod domain;
pub mod remote;
pub mod services;

pub use app::{AppEvent, EventBus, Session};
pub use config::Config;
pub use domain::{EmojiEntry, EmojiToken, ImageExt, UserId};
