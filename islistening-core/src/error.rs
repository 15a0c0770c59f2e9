use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it with your status endpoint and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    // Status endpoint errors
    #[error("Status endpoint returned no content")]
    NoContent,

    #[error("Status endpoint returned HTTP {status}")]
    StatusEndpoint { status: u16 },

    #[error("Malformed playback status: {0}")]
    MalformedStatus(#[from] serde_json::Error),

    // Network errors
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
