//! Client-side playback progress and refresh scheduling.
//!
//! [`ProgressController`] is a synchronous state machine. It interpolates the
//! playback position between fetches, decides when a new fetch is due, and
//! applies fetch results in request order. It performs no I/O; the
//! [`NowPlayingEngine`](crate::engine::NowPlayingEngine) drives it from a timer
//! and runs the fetches it asks for.

use crate::config::ProgressConfig;
use crate::error::CoreError;
use crate::status::{FetchedStatus, PlaybackStatus};
use crate::time::DurationExt;
use std::time::Duration;

fn ms_to_f64(ms: u64) -> f64 {
    f64::from(u32::try_from(ms).unwrap_or(u32::MAX))
}

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing to animate: no status, a status that is not playing, or an error
    Idle,
    /// A playing status is shown and the position advances every tick
    Counting,
    /// A fetch is in flight
    Refreshing,
}

/// What the user sees besides the track itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub is_loading: bool,
    pub is_error: bool,
}

/// Locally interpolated playback position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientProgress {
    pub progress_ms: u64,
    /// `100 * progress_ms / duration_ms`, or 0 for a zero-length track
    pub progress_percent: f64,
}

impl ClientProgress {
    #[must_use]
    pub fn new(progress_ms: u64, duration_ms: u64) -> Self {
        let progress_percent = if duration_ms == 0 {
            0.0
        } else {
            100.0 * ms_to_f64(progress_ms) / ms_to_f64(duration_ms)
        };
        Self {
            progress_ms,
            progress_percent,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress_percent >= 100.0
    }
}

/// Timing knobs, see [`ProgressConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub tick: Duration,
    /// 0 disables retrying after an error
    pub error_retry: Duration,
    pub error_retry_max: Duration,
    /// 0 disables re-polling a status that is not playing
    pub idle_refresh: Duration,
}

impl ControllerConfig {
    #[must_use]
    pub const fn from_progress_config(cfg: &ProgressConfig) -> Self {
        Self {
            tick: Duration::from_millis(cfg.tick_ms),
            error_retry: Duration::from_millis(cfg.error_retry_ms),
            error_retry_max: Duration::from_millis(cfg.error_retry_max_ms),
            idle_refresh: Duration::from_millis(cfg.idle_refresh_ms),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_progress_config(&ProgressConfig::default())
    }
}

/// Permission to run one fetch. Results must be handed back with the same
/// ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

impl RefreshTicket {
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed
    Idle,
    /// The position moved
    Advanced,
    /// A fetch must be started with this ticket
    RefreshDue(RefreshTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Installed { is_playing: bool },
    Failed,
    /// A newer request was issued after this one; the result was dropped
    Stale,
}

#[derive(Debug)]
pub struct ProgressController {
    config: ControllerConfig,
    phase: Phase,
    view: ViewState,
    status: Option<PlaybackStatus>,
    progress_ms: u64,
    /// Sequence number of the most recently issued ticket
    issued_seq: u64,
    /// Sequence number of the most recently applied result
    applied_seq: u64,
    in_flight: Option<u64>,
    consecutive_errors: u32,
    /// Time spent idle since the last fetch, for retry/re-poll timers
    idle_elapsed: Duration,
}

impl ProgressController {
    #[must_use]
    pub const fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            view: ViewState {
                is_loading: false,
                is_error: false,
            },
            status: None,
            progress_ms: 0,
            issued_seq: 0,
            applied_seq: 0,
            in_flight: None,
            consecutive_errors: 0,
            idle_elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn view_state(&self) -> ViewState {
        self.view
    }

    #[must_use]
    pub const fn status(&self) -> Option<&PlaybackStatus> {
        self.status.as_ref()
    }

    #[must_use]
    pub const fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True until the first fetch has been started
    #[must_use]
    pub const fn needs_initial_load(&self) -> bool {
        self.issued_seq == 0
    }

    #[must_use]
    pub fn progress(&self) -> ClientProgress {
        let duration_ms = self.status.as_ref().map_or(0, |s| s.duration_ms);
        ClientProgress::new(self.progress_ms, duration_ms)
    }

    fn is_live(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_playing)
    }

    fn issue_ticket(&mut self) -> RefreshTicket {
        self.issued_seq += 1;
        self.in_flight = Some(self.issued_seq);
        self.phase = Phase::Refreshing;
        self.view = ViewState {
            is_loading: true,
            is_error: false,
        };
        self.idle_elapsed = Duration::ZERO;
        RefreshTicket {
            seq: self.issued_seq,
        }
    }

    /// Start a fetch unless one is already in flight.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        Some(self.issue_ticket())
    }

    /// Start a fetch even if one is in flight. The older request's result
    /// will be discarded as stale.
    pub fn force_refresh(&mut self) -> RefreshTicket {
        self.issue_ticket()
    }

    /// Apply the result of the fetch that `ticket` was issued for.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<FetchedStatus, CoreError>,
    ) -> RefreshOutcome {
        if self.in_flight == Some(ticket.seq) {
            self.in_flight = None;
        }

        // Only the newest request may touch state
        if ticket.seq != self.issued_seq || ticket.seq <= self.applied_seq {
            return RefreshOutcome::Stale;
        }
        self.applied_seq = ticket.seq;
        self.idle_elapsed = Duration::ZERO;

        match result {
            Ok(fetched) => {
                let is_playing = fetched.status.is_playing;
                let animates = is_playing && fetched.status.duration_ms > 0;

                self.consecutive_errors = 0;
                self.progress_ms = fetched.progress_ms;
                self.status = Some(fetched.status);
                self.view = ViewState::default();
                self.phase = if animates { Phase::Counting } else { Phase::Idle };

                RefreshOutcome::Installed { is_playing }
            }
            Err(_) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                self.progress_ms = 0;
                self.status = None;
                self.view = ViewState {
                    is_loading: false,
                    is_error: true,
                };
                self.phase = Phase::Idle;

                RefreshOutcome::Failed
            }
        }
    }

    /// Delay before an idle controller should fetch again, if ever.
    fn idle_delay(&self) -> Option<Duration> {
        if self.view.is_error {
            if self.config.error_retry.is_zero() {
                return None;
            }
            let exponent = self.consecutive_errors.saturating_sub(1).min(16);
            let delay = self
                .config
                .error_retry
                .saturating_mul(2_u32.saturating_pow(exponent));
            Some(delay.min(self.config.error_retry_max))
        } else if self.status.is_some() && !self.config.idle_refresh.is_zero() {
            Some(self.config.idle_refresh)
        } else {
            None
        }
    }

    /// Advance local time by `step`.
    pub fn tick(&mut self, step: Duration) -> TickOutcome {
        match self.phase {
            Phase::Counting | Phase::Refreshing => {
                if !self.is_live() {
                    return TickOutcome::Idle;
                }

                let duration_ms = self.status.as_ref().map_or(0, |s| s.duration_ms);
                let advanced = self.progress_ms < duration_ms;
                if advanced {
                    self.progress_ms = self
                        .progress_ms
                        .saturating_add(step.as_millis_u64())
                        .min(duration_ms);
                }

                // Leaving Counting here is what keeps later ticks from
                // issuing a second fetch for the same track end.
                if self.phase == Phase::Counting && self.progress().is_complete() {
                    if let Some(ticket) = self.begin_refresh() {
                        return TickOutcome::RefreshDue(ticket);
                    }
                }

                if advanced {
                    TickOutcome::Advanced
                } else {
                    TickOutcome::Idle
                }
            }
            Phase::Idle => {
                let Some(delay) = self.idle_delay() else {
                    return TickOutcome::Idle;
                };

                self.idle_elapsed = self.idle_elapsed.saturating_add(step);
                if self.idle_elapsed >= delay {
                    if let Some(ticket) = self.begin_refresh() {
                        return TickOutcome::RefreshDue(ticket);
                    }
                }
                TickOutcome::Idle
            }
        }
    }
}

impl Default for ProgressController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}
