//! Presentation model for the now-playing card.
//!
//! [`render`] turns controller state into plain data; the desktop shell only
//! maps these variants onto markup.

use crate::color::ColorTinter;
use crate::config::PageConfig;
use crate::progress::{ClientProgress, ViewState};
use crate::status::PlaybackStatus;
use crate::time::format_duration;

/// Heading of the apology shown when the status cannot be loaded.
pub const ERROR_TITLE: &str = "Sorry";

/// Body of the apology, followed by a link to the owner's profile.
pub const ERROR_MESSAGE: &str =
    "I'm not currently listening to music, come back a bit later or visit my";

/// Label of the profile link in the apology.
pub const ERROR_LINK_LABEL: &str = "Github";

#[derive(Debug, Clone, PartialEq)]
pub enum NowPlayingView {
    /// The last fetch failed
    Error(ErrorView),
    /// Nothing has been loaded yet
    Loading,
    Track(TrackView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub title: &'static str,
    pub message: &'static str,
    pub link_label: &'static str,
    pub link_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackView {
    pub name: String,
    pub artist: String,
    pub image_url: String,
    /// Opens the track on the streaming service
    pub track_url: String,
    /// CSS color for the page background
    pub background: String,
    /// A fetch is running while this track is shown
    pub is_loading: bool,
    /// Present only while the track is playing
    pub progress: Option<ProgressView>,
}

impl TrackView {
    /// Whether the live indicator should be shown
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.progress.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// Bar width in percent, always within `0..=100`
    pub percent: f64,
    pub elapsed: String,
    pub total: String,
}

impl ProgressView {
    #[must_use]
    pub fn new(progress: ClientProgress, duration_ms: u64) -> Self {
        Self {
            percent: progress.progress_percent.clamp(0.0, 100.0),
            elapsed: format_duration(progress.progress_ms.min(duration_ms)),
            total: format_duration(duration_ms),
        }
    }

    /// Inline style for the bar's filled part
    #[must_use]
    pub fn bar_style(&self) -> String {
        format!("width: {:.2}%", self.percent)
    }
}

/// Build the view for the current state.
#[must_use]
pub fn render(
    view: &ViewState,
    status: Option<&PlaybackStatus>,
    progress: ClientProgress,
    tinter: &ColorTinter,
    page: &PageConfig,
) -> NowPlayingView {
    if view.is_error {
        return NowPlayingView::Error(ErrorView {
            title: ERROR_TITLE,
            message: ERROR_MESSAGE,
            link_label: ERROR_LINK_LABEL,
            link_url: page.profile_url.clone(),
        });
    }

    let Some(status) = status else {
        return NowPlayingView::Loading;
    };

    NowPlayingView::Track(TrackView {
        name: status.name.clone(),
        artist: status.artist.clone(),
        image_url: status.image.to_string(),
        track_url: status.url.to_string(),
        background: tinter.background_for(status),
        is_loading: view.is_loading,
        progress: status
            .is_playing
            .then(|| ProgressView::new(progress, status.duration_ms)),
    })
}
