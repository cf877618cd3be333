//! Playlist model, built-in fallback, and the resolution precedence rules.

use crate::config::PlayerConfig;
use crate::provider::PlaylistProvider;
use serde::{Deserialize, Serialize};
use tracing::warn;

const LOG_TARGET: &str = "glassplay::playlist";

/// One playable track. Immutable once placed in a playlist; identity is the
/// position within the playlist, not the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artist: String,
    /// Streamable audio URL. May be empty when the catalog withheld it.
    pub url: String,
    #[serde(default)]
    pub cover: String,
    /// URL of an LRC document; empty means the track has no lyrics.
    #[serde(default)]
    pub lyric_url: String,
}

impl Track {
    #[must_use]
    pub fn has_lyrics(&self) -> bool {
        !self.lyric_url.is_empty()
    }
}

/// Fixed known-good playlist substituted when remote resolution fails.
#[must_use]
pub fn fallback_playlist() -> Vec<Track> {
    vec![
        Track {
            name: "告白气球".to_string(),
            artist: "周杰伦".to_string(),
            url: "https://music.163.com/song/media/outer/url?id=1846489646.mp3".to_string(),
            cover: "https://p2.music.126.net/JI5LD9bISJzX5F0qSgHkHQ==/109951166361039007.jpg"
                .to_string(),
            lyric_url: "https://cdn.moefe.org/lyric/tell.lrc".to_string(),
        },
        Track {
            name: "不将就".to_string(),
            artist: "李荣浩".to_string(),
            url: "https://music.163.com/song/media/outer/url?id=31654343.mp3".to_string(),
            cover: "https://p2.music.126.net/k_WRxDY4C2kgGmKiCOs0vA==/7869002766674348.jpg"
                .to_string(),
            lyric_url: String::new(),
        },
        Track {
            name: "起风了".to_string(),
            artist: "买辣椒也用券".to_string(),
            url: "https://music.163.com/song/media/outer/url?id=1330348068.mp3".to_string(),
            cover: "https://p1.music.126.net/diGAyEmpymX8G7JcnElncQ==/109951163699673355.jpg"
                .to_string(),
            lyric_url: "https://cdn.moefe.org/lyric/qifengle.lrc".to_string(),
        },
    ]
}

/// Outcome of playlist resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistResolution {
    /// The configuration leaves nothing to play; the engine reports itself
    /// disabled instead of starting.
    Disabled,
    /// A non-empty playlist, either resolved or substituted by the fallback.
    Resolved(Vec<Track>),
}

/// Resolve the playlist for a configuration.
///
/// Precedence: a non-empty `custom_playlist` is returned verbatim with no
/// network call; a disabled config or empty `id` yields
/// [`PlaylistResolution::Disabled`]; otherwise the provider is asked once,
/// and any failure or empty result substitutes the built-in fallback list.
pub async fn resolve_playlist(
    config: &PlayerConfig,
    provider: &dyn PlaylistProvider,
) -> PlaylistResolution {
    if !config.custom_playlist.is_empty() {
        return PlaylistResolution::Resolved(config.custom_playlist.clone());
    }

    if !config.enable || config.id.is_empty() {
        warn!(target: LOG_TARGET, "player not configured or not enabled, skipping playlist fetch");
        return PlaylistResolution::Disabled;
    }

    match provider.fetch_playlist().await {
        Ok(tracks) if !tracks.is_empty() => PlaylistResolution::Resolved(tracks),
        Ok(_) => {
            warn!(
                target: LOG_TARGET,
                provider = provider.name(),
                "provider returned an empty playlist, using fallback"
            );
            PlaylistResolution::Resolved(fallback_playlist())
        }
        Err(e) => {
            warn!(
                target: LOG_TARGET,
                provider = provider.name(),
                error = %e,
                "playlist fetch failed, using fallback"
            );
            PlaylistResolution::Resolved(fallback_playlist())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        tracks: Vec<Track>,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(tracks: Vec<Track>) -> Self {
            Self {
                tracks,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlaylistProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_playlist(&self) -> crate::error::Result<Vec<Track>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tracks.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl PlaylistProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_playlist(&self) -> crate::error::Result<Vec<Track>> {
            Err(CoreError::PlaylistFetchFailed {
                provider: "failing".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    fn track(name: &str) -> Track {
        Track {
            name: name.to_string(),
            artist: "artist".to_string(),
            url: format!("https://example.com/{name}.mp3"),
            cover: String::new(),
            lyric_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_custom_playlist_wins_without_network() {
        let provider = StaticProvider::new(vec![track("remote")]);
        let config = PlayerConfig {
            id: "123".to_string(),
            custom_playlist: vec![track("custom")],
            ..Default::default()
        };

        let resolution = resolve_playlist(&config, &provider).await;
        assert_eq!(
            resolution,
            PlaylistResolution::Resolved(vec![track("custom")])
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_id_reports_disabled() {
        let provider = StaticProvider::new(vec![track("remote")]);
        let config = PlayerConfig::default();

        let resolution = resolve_playlist(&config, &provider).await;
        assert_eq!(resolution, PlaylistResolution::Disabled);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_flag_reports_disabled() {
        let provider = StaticProvider::new(vec![track("remote")]);
        let config = PlayerConfig {
            enable: false,
            id: "123".to_string(),
            ..Default::default()
        };

        let resolution = resolve_playlist(&config, &provider).await;
        assert_eq!(resolution, PlaylistResolution::Disabled);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back() {
        let config = PlayerConfig {
            id: "123".to_string(),
            ..Default::default()
        };

        let resolution = resolve_playlist(&config, &FailingProvider).await;
        let PlaylistResolution::Resolved(tracks) = resolution else {
            panic!("expected resolved playlist");
        };
        assert_eq!(tracks, fallback_playlist());
        assert_eq!(tracks.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_result_falls_back() {
        let provider = StaticProvider::new(Vec::new());
        let config = PlayerConfig {
            id: "123".to_string(),
            ..Default::default()
        };

        let resolution = resolve_playlist(&config, &provider).await;
        assert_eq!(
            resolution,
            PlaylistResolution::Resolved(fallback_playlist())
        );
    }

    #[tokio::test]
    async fn test_remote_playlist_resolved() {
        let provider = StaticProvider::new(vec![track("a"), track("b")]);
        let config = PlayerConfig {
            id: "123".to_string(),
            ..Default::default()
        };

        let resolution = resolve_playlist(&config, &provider).await;
        assert_eq!(
            resolution,
            PlaylistResolution::Resolved(vec![track("a"), track("b")])
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
