#![cfg_attr(feature = "bundle", windows_subsystem = "windows")]
mod app;
mod bridge;
mod components;
mod state;
mod theme_watcher;

use crate::app::App;
use crate::bridge::use_engine_bridge;
use crate::state::NowPlayingState;
use crate::theme_watcher::use_theme_watcher;
use dioxus::desktop::{LogicalSize, WindowBuilder};
use dioxus::prelude::*;
use islistening_core::{
    AnalyticsTag, ColorTinter, ControllerConfig, CoreError, IsListeningConfig, NowPlayingEngine,
    NowPlayingSnapshot, PageConfig, PageContext, StatusFetcher, TomlParseError, CONFIG_TEMPLATE,
};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "islistening";

/// Analytics settings handed to the root component
#[derive(Clone)]
struct Analytics {
    tag: AnalyticsTag,
    page: PageContext,
}

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match IsListeningConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            show_new_config_dialog(&path);
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            show_config_parse_error_dialog(&parse_error, &IsListeningConfig::config_path());
            std::process::exit(1);
        }
        Err(e @ (CoreError::ConfigInvalid { .. } | CoreError::InvalidUrl { .. })) => {
            error!("{e}");
            show_config_error_dialog(&e.to_string(), &IsListeningConfig::config_path());
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            show_generic_error_dialog(&e.to_string());
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let fetcher = match StatusFetcher::from_config(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to create status fetcher: {e}");
            show_generic_error_dialog(&e.to_string());
            std::process::exit(1);
        }
    };
    info!("Status endpoint: {}", fetcher.url());

    // First load happens before the window opens so the first frame shows it
    let first_load = runtime.block_on(fetcher.fetch());
    if let Err(e) = &first_load {
        warn!("Initial status load failed: {e}");
    }

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let engine = NowPlayingEngine::new(
        Arc::new(fetcher),
        ControllerConfig::from_progress_config(&config.progress),
        Some(cancel_token.clone()),
    );
    runtime.block_on(engine.seed(first_load));
    let snapshot = runtime.block_on(engine.snapshot());
    runtime.spawn(Arc::clone(&engine).run());

    let analytics = AnalyticsTag::init(config.analytics.resolve_from_env().as_deref()).map(|tag| {
        Analytics {
            tag,
            page: PageContext {
                location: config.status.base_url.clone(),
                path: "/".to_string(),
                title: config.page.title(),
            },
        }
    });

    let window = WindowBuilder::new()
        .with_title(config.page.title())
        .with_resizable(true)
        .with_always_on_top(config.window.always_on_top)
        .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

    // CSS is handled by the theme_watcher module in the root component
    let dioxus_config = dioxus::desktop::Config::default()
        .with_window(window)
        .with_disable_context_menu(true);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(dioxus_config)
        .with_context(engine)
        .with_context(snapshot)
        .with_context(config.page)
        .with_context(analytics)
        .with_context(Arc::new(ColorTinter::default()))
        .with_context(cancel_token)
        .with_context(runtime.handle().clone())
        .launch(app);
}

/// Root component that sets up context and renders the app
fn app() -> Element {
    let snapshot: NowPlayingSnapshot = use_context();
    let state = use_context_provider(|| NowPlayingState::from_snapshot(&snapshot));

    let engine: Arc<NowPlayingEngine> = use_context();
    use_engine_bridge(engine, state);

    let cancel_token: CancellationToken = use_context();
    let css = use_theme_watcher(cancel_token);

    let page: PageConfig = use_context();
    let title = page.title();

    let analytics: Option<Analytics> = use_context();
    let analytics_scripts = analytics.map(|analytics| {
        (
            analytics.tag.loader_url(),
            analytics.tag.bootstrap_script(&analytics.page),
        )
    });

    rsx! {
        document::Title { "{title}" }
        document::Style { "{css}" }
        if let Some((loader_url, bootstrap)) = analytics_scripts {
            document::Script {
                src: loader_url,
                r#async: true,
            }
            document::Script { "{bootstrap}" }
        }
        App {}
    }
}

/// Show a native OS dialog for an invalid configuration value
fn show_config_error_dialog(error_message: &str, config_path: &Path) {
    let message = format!(
        "{error_message}\n\nPlease edit the configuration file and restart {APP_NAME}."
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("islistening - Configuration Required")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    if matches!(result, MessageDialogResult::Custom(ref s) if s == "Open Config") {
        open_config(config_path);
    }
}

/// Show dialog when config is newly created
fn show_new_config_dialog(config_path: &Path) {
    let message = format!(
        "A configuration file has been created at:\n{}\n\n\
        Please set status.base_url to the site serving\n\
        /api/get-spotify-current and restart {APP_NAME}.",
        config_path.display()
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("islistening - Configuration Created")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    if matches!(result, MessageDialogResult::Custom(ref s) if s == "Open Config") {
        open_config(config_path);
    }
}

/// Show dialog when config file has TOML parsing errors
fn show_config_parse_error_dialog(parse_error: &TomlParseError, config_path: &Path) {
    let message = format!(
        "Your configuration file has a syntax error and cannot be loaded.\n\n\
        Error: {parse_error}\n\n\
        You can either:\n\
        \u{2022} Open the config file and fix the syntax error\n\
        \u{2022} Reset to a fresh configuration template"
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("islistening - Configuration Error")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Reset Config".into(),
        ))
        .show();

    match result {
        MessageDialogResult::Custom(button) if button == "Open Config" => {
            open_config(config_path);
        }
        MessageDialogResult::Custom(button) if button == "Reset Config" => {
            if let Err(e) = std::fs::write(config_path, CONFIG_TEMPLATE) {
                error!("Failed to reset config file: {e}");
                MessageDialog::new()
                    .set_level(MessageLevel::Error)
                    .set_title("islistening - Reset Failed")
                    .set_description(format!("Failed to reset configuration:\n{e}"))
                    .set_buttons(MessageButtons::Ok)
                    .show();
            } else {
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title("islistening - Configuration Reset")
                    .set_description(
                        "Configuration has been reset to the default template.\n\n\
                        Please set your status endpoint and restart the app.",
                    )
                    .set_buttons(MessageButtons::Ok)
                    .show();
                open_config(config_path);
            }
        }
        _ => {
            // User closed dialog or clicked an unexpected button - just exit
        }
    }
}

/// Show a generic error dialog for unexpected errors
fn show_generic_error_dialog(error_message: &str) {
    let message = format!(
        "An unexpected error occurred:\n\n{error_message}\n\n\
        Please check your configuration file or report this issue."
    );

    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("islistening - Error")
        .set_description(&message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn open_config(config_path: &Path) {
    if let Err(e) = open::that(config_path) {
        error!("Failed to open config file: {e}");
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = IsListeningConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper_util=warn,reqwest=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = islistening_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
