//! Transient user-facing notifications ("Saved", "Copied to clipboard!").
//!
//! Replaces the historical pattern of a module-level callback rebound by
//! whichever toast component was mounted: the session owns a [`Notifier`],
//! a bounded queue of pending messages that auto-dismiss after a TTL.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum number of pending notifications; the oldest is dropped first.
const MAX_PENDING: usize = 8;

/// Default display duration, matching the original toast.
const DEFAULT_TTL: Duration = Duration::from_millis(1000);

/// One pending notification.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    posted_at: Instant,
    ttl: Duration,
}

impl Notification {
    /// Whether the notification is still within its display window.
    pub fn is_live(&self) -> bool {
        self.posted_at.elapsed() < self.ttl
    }

    /// Time left before auto-dismissal.
    pub fn time_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.posted_at.elapsed())
    }
}

/// Bounded queue of pending notifications with TTL auto-dismiss.
#[derive(Debug, Default)]
pub struct Notifier {
    queue: VecDeque<Notification>,
}

impl Notifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a notification with the default display duration.
    pub fn push(&mut self, message: impl Into<String>) {
        self.push_with_ttl(message, DEFAULT_TTL);
    }

    /// Queues a notification with an explicit display duration.
    pub fn push_with_ttl(&mut self, message: impl Into<String>, ttl: Duration) {
        self.prune();
        self.queue.push_back(Notification {
            message: message.into(),
            posted_at: Instant::now(),
            ttl,
        });
        while self.queue.len() > MAX_PENDING {
            self.queue.pop_front();
        }
    }

    /// Returns the notifications still within their display window, oldest
    /// first, pruning expired ones.
    pub fn active(&mut self) -> Vec<&Notification> {
        self.prune();
        self.queue.iter().collect()
    }

    /// Drops everything, e.g. on sign-out.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn prune(&mut self) {
        self.queue.retain(Notification::is_live);
    }
}
