pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod lrc;
pub mod player;
pub mod playlist;
pub mod provider;
pub mod state;
pub mod store;

pub use audio::{AudioBackend, AudioEvent, AudioResource};
pub use config::{PlayMode, PlayerConfig, Server};
pub use error::CoreError;
pub use events::{EventBus, PlayerEvent};
pub use lrc::{LyricLine, LyricTimeline};
pub use player::{Player, PlayerBuilder, PlayerCommand};
pub use playlist::{fallback_playlist, Track};
pub use provider::{LyricsSource, PlaylistProvider};
pub use state::PlayerState;
pub use store::{KeyValueStore, STORE_PREFIX};

/// Re-export of the toml parse error for config error handling.
pub use toml::de::Error as TomlParseError;
