use dioxus::prelude::*;
use islistening_core::{ClientProgress, NowPlayingSnapshot, PlaybackStatus, ViewState};

/// UI copy of the engine state, one signal per concern so a progress tick
/// only re-renders what reads the progress.
#[derive(Clone, Copy)]
pub struct NowPlayingState {
    pub view: Signal<ViewState>,
    pub status: Signal<Option<PlaybackStatus>>,
    pub progress: Signal<ClientProgress>,
}

impl NowPlayingState {
    /// Start from the engine state captured before launch, so the first frame
    /// already shows the first load.
    #[must_use]
    pub fn from_snapshot(snapshot: &NowPlayingSnapshot) -> Self {
        Self {
            view: Signal::new(snapshot.view),
            status: Signal::new(snapshot.status.clone()),
            progress: Signal::new(snapshot.progress),
        }
    }

    /// Overwrite every signal with `snapshot`
    pub fn sync(&mut self, snapshot: &NowPlayingSnapshot) {
        self.view.set(snapshot.view);
        self.status.set(snapshot.status.clone());
        self.progress.set(snapshot.progress);
    }

    /// A fetch started; the current track stays visible
    pub fn set_loading(&mut self) {
        self.view.set(ViewState {
            is_loading: true,
            is_error: false,
        });
    }

    /// A fetch installed a new status
    pub fn install(&mut self, status: PlaybackStatus, progress: ClientProgress) {
        self.status.set(Some(status));
        self.progress.set(progress);
        self.view.set(ViewState::default());
    }

    pub fn set_progress(&mut self, progress: ClientProgress) {
        if *self.progress.peek() != progress {
            self.progress.set(progress);
        }
    }

    /// A fetch failed; only the apology is shown
    pub fn fail(&mut self) {
        self.status.set(None);
        self.progress.set(ClientProgress::default());
        self.view.set(ViewState {
            is_loading: false,
            is_error: true,
        });
    }
}
