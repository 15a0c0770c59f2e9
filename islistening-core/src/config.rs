use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Path of the status endpoint, relative to `status.base_url`.
pub const STATUS_PATH: &str = "/api/get-spotify-current";

/// Environment variable that overrides `analytics.tracking_id`.
pub const ANALYTICS_ENV_VAR: &str = "GOOGLE_ANALYTICS_CODE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsListeningConfig {
    pub status: StatusConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Origin serving the status endpoint, e.g. `https://islistening.example.com`
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Local interpolation step for the progress bar
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// First retry delay after a failed fetch; 0 disables retrying
    #[serde(default = "default_error_retry_ms")]
    pub error_retry_ms: u64,
    /// Upper bound for the doubling retry delay
    #[serde(default = "default_error_retry_max_ms")]
    pub error_retry_max_ms: u64,
    /// Re-poll interval while showing a track that is not playing; 0 disables it
    #[serde(default = "default_idle_refresh_ms")]
    pub idle_refresh_ms: u64,
}

const fn default_tick_ms() -> u64 {
    100
}

const fn default_error_retry_ms() -> u64 {
    5_000
}

const fn default_error_retry_max_ms() -> u64 {
    120_000
}

const fn default_idle_refresh_ms() -> u64 {
    60_000
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            error_retry_ms: default_error_retry_ms(),
            error_retry_max_ms: default_error_retry_max_ms(),
            idle_refresh_ms: default_idle_refresh_ms(),
        }
    }
}

/// Text and links shown around the track card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Whose listening is shown, used in the window title
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
    /// Link offered when nothing is playing
    #[serde(default = "default_profile_url")]
    pub profile_url: String,
    /// Link in the footer
    #[serde(default = "default_source_url")]
    pub source_url: String,
}

fn default_owner_name() -> String {
    "Raed".to_string()
}

fn default_profile_url() -> String {
    "https://github.com/RaedsLab".to_string()
}

fn default_source_url() -> String {
    "https://github.com/RaedsLab/islistening".to_string()
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            owner_name: default_owner_name(),
            profile_url: default_profile_url(),
            source_url: default_source_url(),
        }
    }
}

impl PageConfig {
    #[must_use]
    pub fn title(&self) -> String {
        format!("What is {} playing", self.owner_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Analytics tag id; absent or empty disables analytics
    #[serde(default)]
    pub tracking_id: Option<String>,
}

impl AnalyticsConfig {
    /// Resolve the tracking id, letting `override_id` (usually the
    /// environment) win over the config file when it is non-empty.
    #[must_use]
    pub fn resolve(&self, override_id: Option<String>) -> Option<String> {
        override_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.tracking_id.clone())
            .filter(|id| !id.trim().is_empty())
    }

    /// Resolve the tracking id against [`ANALYTICS_ENV_VAR`].
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        self.resolve(std::env::var(ANALYTICS_ENV_VAR).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: f64,
    #[serde(default = "default_window_height")]
    pub height: f64,
    #[serde(default)]
    pub always_on_top: bool,
}

const fn default_window_width() -> f64 {
    720.0
}

const fn default_window_height() -> f64 {
    480.0
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            always_on_top: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/islistening/islistening.log
    #[serde(default)]
    pub enabled: bool,
}

impl IsListeningConfig {
    /// Get the configuration directory path (~/.config/islistening/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/islistening/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create the template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path` or create the template there
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_or_create`].
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate values that serde cannot check
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.status.base_url.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "status.base_url must not be empty".into(),
            });
        }
        self.status_url()?;

        if self.progress.tick_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "progress.tick_ms must be greater than 0".into(),
            });
        }
        if self.progress.error_retry_max_ms < self.progress.error_retry_ms {
            return Err(CoreError::ConfigInvalid {
                message: "progress.error_retry_max_ms must not be below progress.error_retry_ms"
                    .into(),
            });
        }
        Ok(())
    }

    /// Full URL of the status endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if `status.base_url` is not an http(s) URL.
    pub fn status_url(&self) -> Result<Url> {
        let base = Url::parse(self.status.base_url.trim()).map_err(|source| {
            CoreError::InvalidUrl {
                url: self.status.base_url.clone(),
                source,
            }
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(CoreError::ConfigInvalid {
                message: format!("status.base_url must be http or https, got {}", base.scheme()),
            });
        }

        base.join(STATUS_PATH).map_err(|source| CoreError::InvalidUrl {
            url: self.status.base_url.clone(),
            source,
        })
    }
}

pub const CONFIG_TEMPLATE: &str = r##"# islistening configuration
# ~/.config/islistening/config.toml

[status]
# Required: origin that serves /api/get-spotify-current
base_url = "http://127.0.0.1:3000"
timeout_secs = 10

[progress]
# Progress bar interpolation step
tick_ms = 100
# Retry after a failed fetch, doubling up to error_retry_max_ms (0 = never retry)
error_retry_ms = 5000
error_retry_max_ms = 120000
# Re-check while showing a track that is not playing (0 = never)
idle_refresh_ms = 60000

[page]
owner_name = "Raed"
profile_url = "https://github.com/RaedsLab"
source_url = "https://github.com/RaedsLab/islistening"

[analytics]
# Optional analytics tag id; GOOGLE_ANALYTICS_CODE overrides it
# tracking_id = ""

[window]
width = 720.0
height = 480.0
always_on_top = false

[logging]
# Also write logs to ~/.config/islistening/islistening.log
enabled = false
"##;
