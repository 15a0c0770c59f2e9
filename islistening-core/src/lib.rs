pub mod analytics;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod paths;
pub mod progress;
pub mod source;
pub mod status;
pub mod time;
pub mod view;

pub use analytics::{AnalyticsTag, PageContext};
pub use color::{hex_to_rgba_tint, id_to_color_tint, ColorTinter, TintCache, DEFAULT_TINT};
pub use config::{
    AnalyticsConfig, IsListeningConfig, LoggingConfig, PageConfig, ProgressConfig, StatusConfig,
    WindowConfig, CONFIG_TEMPLATE,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use engine::{NowPlayingEngine, NowPlayingEvent, NowPlayingSnapshot};
pub use error::CoreError;
pub use fetcher::StatusFetcher;
pub use paths::{
    config_dir, config_path, log_file_path, theme_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    LOG_FILE_NAME, THEME_FILE_NAME,
};
pub use progress::{ClientProgress, ControllerConfig, Phase, ProgressController, ViewState};
pub use source::StatusSource;
pub use status::{FetchedStatus, PlaybackStatus};
pub use time::{format_duration, DurationExt};
pub use view::{ErrorView, NowPlayingView, ProgressView, TrackView};
