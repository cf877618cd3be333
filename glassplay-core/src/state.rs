//! The single source of truth for observable playback state.

use crate::config::{PlayMode, PlayerConfig};
use crate::playlist::Track;
use std::time::Duration;

/// Snapshot of the player's observable state. The current track is always
/// derived from `playlist[current_index]`, never stored separately.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub is_playing: bool,
    pub current_index: usize,
    pub playlist: Vec<Track>,
    pub position: Duration,
    pub duration: Duration,
    /// Output volume in `[0, 1]`.
    pub volume: f32,
    pub play_mode: PlayMode,
    /// True while playlist resolution is in flight.
    pub is_loading: bool,
    /// False when the configuration left the engine with nothing to play.
    pub enabled: bool,
    /// Index of the active lyric line, `None` before the first line starts
    /// or when no timeline is loaded.
    pub lyric_index: Option<usize>,
}

impl PlayerState {
    pub(crate) fn new(config: &PlayerConfig) -> Self {
        Self {
            is_playing: false,
            current_index: 0,
            playlist: Vec::new(),
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: config.volume.clamp(0.0, 1.0),
            play_mode: config.play_mode,
            is_loading: true,
            enabled: true,
            lyric_index: None,
        }
    }

    /// The track at the current index, `None` when the playlist is empty.
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.get(self.current_index)
    }
}
