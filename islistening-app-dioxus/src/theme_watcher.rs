//! User stylesheet with hot reload.
//!
//! The embedded default theme is copied to `~/.config/islistening/theme.css`
//! on first run. Edits to that file are picked up while the window is open.

use dioxus::prelude::*;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Failed to read theme file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to initialize file watcher: {0}")]
    WatcherError(#[from] notify::Error),
}

/// Default stylesheet compiled into the binary
pub const DEFAULT_CSS: &str = include_str!("../assets/default_theme.css");

const DEBOUNCE: Duration = Duration::from_millis(300);

/// Read the theme at `path`, writing the default there first if it is missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// read or written.
pub fn initialize_theme_at(path: &Path) -> Result<String, ThemeError> {
    if path.exists() {
        info!("Loading theme from {}", path.display());
        return Ok(fs::read_to_string(path)?);
    }

    info!("Creating default theme at {}", path.display());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CSS)?;

    Ok(DEFAULT_CSS.to_string())
}

/// Read the theme at `path`, or the default if it cannot be read.
#[must_use]
pub fn load_theme_css_at(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        warn!("Failed to read theme file, using embedded CSS: {}", e);
        DEFAULT_CSS.to_string()
    })
}

/// Watch `path` and send on `tx` whenever it changes, until cancelled.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the directory cannot
/// be watched.
async fn watch_theme(
    path: PathBuf,
    tx: mpsc::Sender<()>,
    cancel_token: CancellationToken,
) -> Result<(), ThemeError> {
    let file_name = path.file_name().map(ToOwned::to_owned);
    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| {
        let Ok(events) = res else {
            return;
        };
        // Other files in the config directory are ignored
        let touched = events
            .iter()
            .any(|event| event.path.file_name() == file_name.as_deref());
        if touched {
            let _ = tx.blocking_send(());
        }
    })?;

    // Editors often replace the file, so watch its directory instead
    let watch_dir = path.parent().map_or_else(|| path.clone(), Path::to_path_buf);
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)?;

    info!("Watching theme file for changes: {}", path.display());
    cancel_token.cancelled().await;
    debug!("Theme watcher shutting down");

    drop(debouncer);
    Ok(())
}

/// Dioxus hook returning the current stylesheet, updated when the theme file
/// changes on disk.
#[must_use]
pub fn use_theme_watcher(cancel_token: CancellationToken) -> Signal<String> {
    let mut css_content = use_signal(|| {
        initialize_theme_at(&islistening_core::theme_path()).unwrap_or_else(|e| {
            error!("Failed to initialize theme: {}", e);
            DEFAULT_CSS.to_string()
        })
    });

    use_future(move || {
        let cancel_token = cancel_token.clone();

        async move {
            let theme_path = islistening_core::theme_path();
            let (tx, mut rx) = mpsc::channel::<()>(16);

            spawn(watch_or_log(theme_path.clone(), tx, cancel_token.clone()));

            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => break,
                    changed = rx.recv() => {
                        if changed.is_none() {
                            break;
                        }
                        info!("Theme file changed, reloading CSS");
                        css_content.set(load_theme_css_at(&theme_path));
                    }
                }
            }
        }
    });

    css_content
}

async fn watch_or_log(path: PathBuf, tx: mpsc::Sender<()>, cancel_token: CancellationToken) {
    if let Err(e) = watch_theme(path, tx, cancel_token).await {
        error!("Theme hot-reload disabled: {}", e);
    }
}
