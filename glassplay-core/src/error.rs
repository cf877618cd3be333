use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Builder errors
    #[error("Missing required dependency for player construction: {field}")]
    MissingDependency { field: &'static str },

    #[error("Audio event stream is already attached to a controller")]
    AlreadyAttached,

    // Network-facing errors (absorbed by the engine, never fatal)
    #[error("Failed to build HTTP client: {reason}")]
    HttpClient { reason: String },

    #[error("Playlist fetch via {provider} failed: {reason}")]
    PlaylistFetchFailed { provider: String, reason: String },

    #[error("Lyric fetch from {url} failed: {reason}")]
    LyricsFetchFailed { url: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
