//! HTTP client for the "currently playing" status endpoint.

use crate::config::IsListeningConfig;
use crate::error::{CoreError, Result};
use crate::source::StatusSource;
use crate::status::{FetchedStatus, PlaybackStatus};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("islistening/", env!("CARGO_PKG_VERSION"));

/// Fetches and normalizes the playback status.
///
/// Used both for the first load before the window opens and for every
/// refresh afterwards, so both apply the same elapsed-time correction.
pub struct StatusFetcher {
    client: reqwest::Client,
    url: Url,
}

impl StatusFetcher {
    /// Create a fetcher for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, url })
    }

    /// Create a fetcher from the `[status]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &IsListeningConfig) -> Result<Self> {
        Self::new(
            config.status_url()?,
            Duration::from_secs(config.status.timeout_secs),
        )
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// GET the endpoint once and normalize the response.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Network`] if the request fails
    /// - [`CoreError::NoContent`] for 204 or an empty body
    /// - [`CoreError::StatusEndpoint`] for any other non-2xx status
    /// - [`CoreError::MalformedStatus`] if the body is not a valid status
    pub async fn fetch(&self) -> Result<FetchedStatus> {
        debug!("GET {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Err(CoreError::NoContent);
        }
        if !status.is_success() {
            return Err(CoreError::StatusEndpoint {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(CoreError::NoContent);
        }

        let playback: PlaybackStatus = serde_json::from_str(&body)?;
        let fetched = FetchedStatus::normalize(playback, Utc::now());

        debug!(
            "Fetched status: playing={}, track={} - {}, position={}ms/{}ms",
            fetched.status.is_playing,
            fetched.status.artist,
            fetched.status.name,
            fetched.progress_ms,
            fetched.status.duration_ms
        );

        Ok(fetched)
    }
}

#[async_trait]
impl StatusSource for StatusFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_status(&self) -> Result<FetchedStatus> {
        self.fetch().await
    }
}
