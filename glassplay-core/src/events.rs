//! Typed outbound event bus for host notifications.

use crate::playlist::Track;
use std::time::Duration;
use tokio::sync::broadcast;

/// Notifications announced to the hosting environment. One-directional and
/// fire-and-forget: never awaited, never affecting engine state, dropped
/// silently when nobody is subscribed.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The playing flag or current index changed.
    StateChanged { is_playing: bool, index: usize },
    /// A different track was loaded.
    TrackChanged { index: usize, track: Track },
    /// Playback position tick.
    TimeUpdate {
        position: Duration,
        duration: Duration,
    },
    /// A lyric timeline was installed (or cleared) for the current track.
    LyricsUpdated { lines: usize },
    /// Playlist resolution finished with a non-empty playlist.
    PlaylistResolved { len: usize },
    /// Every track in the playlist failed in a row; the engine stopped
    /// auto-advancing.
    Stalled,
}

/// Broadcast bus the host subscribes to.
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: PlayerEvent) {
        // Send fails only when there are no subscribers; that is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(PlayerEvent::Stalled);
        assert!(matches!(rx.recv().await, Ok(PlayerEvent::Stalled)));
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.emit(PlayerEvent::PlaylistResolved { len: 3 });
    }
}
