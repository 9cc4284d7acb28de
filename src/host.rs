//! Capability interfaces supplied by the host runtime.
//!
//! The engine is constructed against these traits so it can run (and be
//! tested) without a live chat server behind it.

use crate::protocol::GameEvent;
use crate::types::{RoomId, UserId};
use tokio::sync::broadcast;

/// Identity resolution for userids the host knows about.
pub trait Identity: Send + Sync {
    /// Display name for a user, or `None` if the user is not currently
    /// known/online. Callers fall back to the raw userid.
    fn display_name(&self, user: &UserId) -> Option<String>;

    /// Whether two userids currently share a network origin. Used to block
    /// one underlying user from signing up twice under different names.
    fn same_origin(&self, a: &UserId, b: &UserId) -> bool;
}

/// Delivery of engine announcements to a room. Fire-and-forget; the engine
/// never waits on the presentation layer.
pub trait RoomSink: Send + Sync {
    fn deliver(&self, room: &RoomId, event: GameEvent);
}

/// A `RoomSink` backed by a tokio broadcast channel. Suitable for hosts that
/// fan announcements out to connected clients, and for tests that want to
/// observe the engine's output.
pub struct ChannelSink {
    tx: broadcast::Sender<(RoomId, GameEvent)>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(RoomId, GameEvent)> {
        self.tx.subscribe()
    }
}

impl RoomSink for ChannelSink {
    fn deliver(&self, room: &RoomId, event: GameEvent) {
        // No receivers connected is fine
        let _ = self.tx.send((room.clone(), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_to_subscribers() {
        let sink = ChannelSink::new(16);
        let mut rx = sink.subscribe();

        sink.deliver(&"trivia".to_string(), GameEvent::GameStarted);

        let (room, event) = rx.try_recv().unwrap();
        assert_eq!(room, "trivia");
        assert_eq!(event, GameEvent::GameStarted);
    }

    #[test]
    fn test_channel_sink_without_subscribers_does_not_panic() {
        let sink = ChannelSink::new(16);
        sink.deliver(&"trivia".to_string(), GameEvent::Stalemate);
    }
}
