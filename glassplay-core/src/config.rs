use crate::error::{CoreError, Result};
use crate::playlist::Track;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Music catalog backing the remote playlist API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    /// NetEase Cloud Music
    #[default]
    Netease,
    /// QQ Music
    Tencent,
    /// Kugou Music
    Kugou,
}

impl Server {
    /// Query-parameter value used by the playlist API. Stable, do not rename.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Netease => "netease",
            Self::Tencent => "tencent",
            Self::Kugou => "kugou",
        }
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track-advance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Sequential order, wrapping at both ends
    #[default]
    List,
    /// Uniformly random pick (may repeat the current track)
    Random,
    /// Repeat the current track on natural end of playback
    Single,
}

/// Engine configuration supplied by the host. Read-only once the player starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Master switch; a disabled player resolves no playlist and never plays.
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Music catalog queried for the remote playlist.
    #[serde(default)]
    pub server: Server,
    /// Remote playlist ID. Empty means no remote playlist is configured.
    #[serde(default)]
    pub id: String,
    /// Initial volume in `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Start playback automatically whenever a track loads.
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub play_mode: PlayMode,
    /// Caller-supplied playlist; when non-empty it wins over the remote API.
    #[serde(default)]
    pub custom_playlist: Vec<Track>,
    /// Persist and restore the playback position via the host's store.
    #[serde(default = "default_true")]
    pub remember_progress: bool,
    /// Persist and restore the playlist index via the host's store.
    #[serde(default = "default_true")]
    pub remember_playlist: bool,
    /// Override for the playlist API endpoint; `None` uses the provider default.
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_volume() -> f32 {
    0.7
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            enable: true,
            server: Server::default(),
            id: String::new(),
            volume: default_volume(),
            autoplay: false,
            play_mode: PlayMode::default(),
            custom_playlist: Vec::new(),
            remember_progress: true,
            remember_playlist: true,
            api_endpoint: None,
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML for this structure.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load a configuration from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] if the file does not exist, or a
    /// parse/IO error otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Whether the configuration leaves the engine with nothing to play:
    /// disabled outright, or no playlist ID and no custom playlist.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        !self.enable || (self.id.is_empty() && self.custom_playlist.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert!(config.enable);
        assert_eq!(config.server, Server::Netease);
        assert!((config.volume - 0.7).abs() < f32::EPSILON);
        assert!(!config.autoplay);
        assert_eq!(config.play_mode, PlayMode::List);
        assert!(config.remember_progress);
        assert!(config.remember_playlist);
    }

    #[test]
    fn test_from_toml_str() {
        let config = PlayerConfig::from_toml_str(
            r#"
server = "tencent"
id = "12345"
volume = 0.5
autoplay = true
play_mode = "random"
"#,
        )
        .unwrap();
        assert_eq!(config.server, Server::Tencent);
        assert_eq!(config.id, "12345");
        assert!((config.volume - 0.5).abs() < f32::EPSILON);
        assert!(config.autoplay);
        assert_eq!(config.play_mode, PlayMode::Random);
    }

    #[test]
    fn test_custom_playlist_from_toml() {
        let config = PlayerConfig::from_toml_str(
            r#"
[[custom_playlist]]
name = "Song"
artist = "Artist"
url = "https://example.com/a.mp3"
"#,
        )
        .unwrap();
        assert_eq!(config.custom_playlist.len(), 1);
        assert_eq!(config.custom_playlist[0].name, "Song");
        assert!(config.custom_playlist[0].cover.is_empty());
        assert!(config.custom_playlist[0].lyric_url.is_empty());
    }

    #[test]
    fn test_is_disabled() {
        let mut config = PlayerConfig::default();
        assert!(config.is_disabled());

        config.id = "123".to_string();
        assert!(!config.is_disabled());

        config.enable = false;
        assert!(config.is_disabled());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(PlayerConfig::from_toml_str("server = \"itunes\"").is_err());
    }
}
