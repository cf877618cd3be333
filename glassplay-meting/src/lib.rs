//! Meting API playlist provider and plain-HTTP lyric source.
//!
//! The Meting API aggregates several music catalogs (NetEase, QQ, Kugou)
//! behind one JSON endpoint. Responses differ per catalog, so track mapping
//! goes through ordered field-name candidate lists instead of a fixed schema.

use async_trait::async_trait;
use glassplay_core::{CoreError, LyricsSource, PlayerConfig, PlaylistProvider, Server, Track};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public Meting deployment used when the host does not override it.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.i-meto.com/meting/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = "glassplay/0.1";

// Field-name candidates per track attribute, in precedence order. Different
// Meting deployments and catalogs disagree on the names.
const NAME_FIELDS: &[&str] = &["title", "name"];
const ARTIST_FIELDS: &[&str] = &["author", "artist"];
const URL_FIELDS: &[&str] = &["url"];
const COVER_FIELDS: &[&str] = &["pic", "cover"];
const LYRIC_FIELDS: &[&str] = &["lrc"];

const UNKNOWN_TITLE: &str = "未知歌曲";
const UNKNOWN_ARTIST: &str = "未知艺术家";

/// Playlist provider backed by a Meting API deployment.
pub struct MetingClient {
    client: reqwest::Client,
    endpoint: String,
    server: Server,
    playlist_id: String,
}

impl MetingClient {
    /// Create a client against the default public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(server: Server, playlist_id: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_endpoint(DEFAULT_API_ENDPOINT, server, playlist_id)
    }

    /// Create a client against a custom Meting deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        server: Server,
        playlist_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint.into(),
            server,
            playlist_id: playlist_id.into(),
        })
    }

    /// Create a client from the player configuration, honoring its endpoint
    /// override.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &PlayerConfig) -> Result<Self, CoreError> {
        let endpoint = config
            .api_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        Self::with_endpoint(endpoint, config.server, config.id.clone())
    }

    fn playlist_url(&self) -> String {
        format!(
            "{}?server={}&type=playlist&id={}",
            self.endpoint,
            self.server.as_str(),
            urlencoding::encode(&self.playlist_id)
        )
    }
}

#[async_trait]
impl PlaylistProvider for MetingClient {
    fn name(&self) -> &'static str {
        "meting"
    }

    async fn fetch_playlist(&self) -> Result<Vec<Track>, CoreError> {
        let url = self.playlist_url();
        info!(server = %self.server, id = %self.playlist_id, "fetching playlist from Meting");
        debug!(%url, "Meting GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Meting returned an error status");
            return Err(fetch_error(format!("unexpected status {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("invalid JSON body: {e}")))?;

        let tracks = parse_playlist_body(&body)?;
        info!(tracks = tracks.len(), "Meting playlist mapped");
        Ok(tracks)
    }
}

/// Map the raw Meting response into tracks. The body must be a JSON array.
/// Every entry maps to a track, keeping indices aligned with the remote
/// catalog: a missing URL becomes an empty string, and attempting to play
/// such a track errors and auto-advances like any other playback failure.
fn parse_playlist_body(body: &Value) -> Result<Vec<Track>, CoreError> {
    let items = body
        .as_array()
        .ok_or_else(|| fetch_error("response body is not a JSON array".to_string()))?;

    Ok(items.iter().map(map_track).collect())
}

fn map_track(item: &Value) -> Track {
    Track {
        name: pick(item, NAME_FIELDS).unwrap_or(UNKNOWN_TITLE).to_string(),
        artist: pick(item, ARTIST_FIELDS)
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string(),
        url: pick(item, URL_FIELDS).unwrap_or_default().to_string(),
        cover: pick(item, COVER_FIELDS).unwrap_or_default().to_string(),
        lyric_url: pick(item, LYRIC_FIELDS).unwrap_or_default().to_string(),
    }
}

/// First candidate field that holds a non-empty string.
fn pick<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|field| {
        item.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

fn fetch_error(reason: String) -> CoreError {
    CoreError::PlaylistFetchFailed {
        provider: "meting".to_string(),
        reason,
    }
}

/// Lyric source that downloads raw LRC text from the URL carried by a track.
pub struct HttpLyricsSource {
    client: reqwest::Client,
}

impl HttpLyricsSource {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl LyricsSource for HttpLyricsSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_lyrics(&self, url: &str) -> Result<String, CoreError> {
        debug!(%url, "fetching lyrics");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| lyric_error(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(lyric_error(url, format!("unexpected status {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| lyric_error(url, format!("unreadable body: {e}")))
    }
}

fn lyric_error(url: &str, reason: String) -> CoreError {
    CoreError::LyricsFetchFailed {
        url: url.to_string(),
        reason,
    }
}

fn build_http_client() -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CoreError::HttpClient {
            reason: e.to_string(),
        })
}
