//! Path constants for configuration, theme and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "islistening";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the user-editable theme file
pub const THEME_FILE_NAME: &str = "theme.css";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "islistening.log";

/// Get the configuration directory path (~/.config/islistening/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/islistening/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the theme file path (~/.config/islistening/theme.css)
#[must_use]
pub fn theme_path() -> PathBuf {
    config_dir().join(THEME_FILE_NAME)
}

/// Get the log file path (~/.config/islistening/islistening.log)
#[must_use]
pub fn log_file_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}
