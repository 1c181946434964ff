//! Session event bus.
//!
//! Cross-component signals that the original implementation routed through
//! module-level mutable callbacks (clear-the-textbox, show-a-toast) travel
//! as broadcast events instead. Subscribers that fall behind miss events
//! rather than blocking the session.

use tokio::sync::broadcast;

/// Events emitted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// An add-submission produced at least one entry; the input field
    /// should be cleared.
    InputCleared,
    /// A remote write completed.
    Saved,
    /// The list content changed wholesale (mount fetch or rollback);
    /// renders should refresh from state.
    ListReplaced,
    /// A payload was written to the clipboard.
    Copied,
}

/// Broadcast channel for [`AppEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emits an event. Having no subscribers is fine.
    pub fn emit(&self, event: AppEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::InputCleared);
        bus.emit(AppEvent::Saved);

        assert_eq!(rx.recv().await.unwrap(), AppEvent::InputCleared);
        assert_eq!(rx.recv().await.unwrap(), AppEvent::Saved);
    }

    #[test]
    fn emitting_without_subscribers_is_a_noop() {
        let bus = EventBus::default();
        bus.emit(AppEvent::Copied);
    }
}
