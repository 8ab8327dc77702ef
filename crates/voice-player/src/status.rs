//! Status broadcast for UI consumers.
//!
//! Rows subscribe once and re-highlight whenever a snapshot arrives.

use tokio::sync::broadcast;

use voice_bridge_types::PlaybackStatus;

/// Bounded broadcast channel of [`PlaybackStatus`] snapshots.
#[derive(Clone)]
pub struct StatusBus {
    sender: broadcast::Sender<PlaybackStatus>,
}

impl StatusBus {
    /// Create a bus; a zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackStatus> {
        self.sender.subscribe()
    }

    /// Publish a snapshot. Having no subscribers is not an error.
    pub fn publish(&self, status: PlaybackStatus) {
        let _ = self.sender.send(status);
    }
}
