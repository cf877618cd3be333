//! Trait seams for the engine's network collaborators.

use crate::error::Result;
use crate::playlist::Track;
use async_trait::async_trait;

/// Resolves a list of playable tracks from a remote catalog.
///
/// Implementations issue a single request per call; the engine applies its
/// own fallback policy on failure, so providers should not retry.
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// Human-readable provider name, used in logs and error detail.
    fn name(&self) -> &'static str;

    /// Fetch the playlist.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success HTTP status, or a
    /// malformed response body.
    async fn fetch_playlist(&self) -> Result<Vec<Track>>;
}

/// Fetches raw LRC text from a lyric URL carried by a track.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the lyric body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success HTTP status.
    async fn fetch_lyrics(&self, url: &str) -> Result<String>;
}
