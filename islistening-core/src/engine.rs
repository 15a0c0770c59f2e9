use crate::error::Result;
use crate::progress::{
    ClientProgress, ControllerConfig, Phase, ProgressController, RefreshOutcome, RefreshTicket,
    TickOutcome, ViewState,
};
use crate::source::StatusSource;
use crate::status::{FetchedStatus, PlaybackStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Events emitted by the engine
#[derive(Debug, Clone)]
pub enum NowPlayingEvent {
    /// A fetch started
    Loading,
    /// A fetch installed a new status
    StatusLoaded {
        status: PlaybackStatus,
        progress: ClientProgress,
    },
    /// The local position moved
    Progress { progress: ClientProgress },
    /// A fetch failed; nothing is shown besides the apology
    Failed { message: String },
}

/// Everything the view needs at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingSnapshot {
    pub phase: Phase,
    pub view: ViewState,
    pub status: Option<PlaybackStatus>,
    pub progress: ClientProgress,
}

/// Drives a [`ProgressController`] from a timer and runs the fetches it asks for.
pub struct NowPlayingEngine {
    controller: RwLock<ProgressController>,
    source: Arc<dyn StatusSource>,
    tick_interval: Duration,
    event_tx: broadcast::Sender<NowPlayingEvent>,
    cancel_token: CancellationToken,
}

impl NowPlayingEngine {
    /// Create a new engine
    ///
    /// # Arguments
    /// * `source` - Where statuses are fetched from
    /// * `config` - Tick cadence and retry timing
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn new(
        source: Arc<dyn StatusSource>,
        config: ControllerConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(64);

        Arc::new(Self {
            controller: RwLock::new(ProgressController::new(config)),
            source,
            tick_interval: config.tick,
            event_tx,
            cancel_token: cancel_token.unwrap_or_default(),
        })
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<NowPlayingEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Current state for rendering
    pub async fn snapshot(&self) -> NowPlayingSnapshot {
        let controller = self.controller.read().await;
        NowPlayingSnapshot {
            phase: controller.phase(),
            view: controller.view_state(),
            status: controller.status().cloned(),
            progress: controller.progress(),
        }
    }

    /// Install the result of a fetch made before the engine started (the
    /// shell's first load), as if it were the engine's own first fetch.
    pub async fn seed(&self, result: Result<FetchedStatus>) {
        let ticket = self.controller.write().await.force_refresh();
        self.finish_refresh(ticket, result).await;
    }

    /// Start the tick loop in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the tick loop until cancelled
    pub async fn run(self: Arc<Self>) {
        info!(
            "Starting now-playing engine (source: {}, tick: {:?})",
            self.source.name(),
            self.tick_interval
        );

        let initial = {
            let mut controller = self.controller.write().await;
            if controller.needs_initial_load() {
                controller.begin_refresh()
            } else {
                None
            }
        };
        if let Some(ticket) = initial {
            self.spawn_fetch(ticket);
        }

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Now-playing engine shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.on_tick().await;
                }
            }
        }
    }

    /// Fetch now unless a fetch is already in flight.
    ///
    /// Returns whether a fetch was started.
    pub async fn refresh_now(self: &Arc<Self>) -> bool {
        let Some(ticket) = self.controller.write().await.begin_refresh() else {
            debug!("Refresh requested while a fetch is in flight, ignoring");
            return false;
        };
        info!("Manual refresh requested (request #{})", ticket.seq());
        self.spawn_fetch(ticket);
        true
    }

    async fn on_tick(self: &Arc<Self>) {
        let (outcome, progress) = {
            let mut controller = self.controller.write().await;
            let outcome = controller.tick(self.tick_interval);
            (outcome, controller.progress())
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Advanced => {
                let _ = self.event_tx.send(NowPlayingEvent::Progress { progress });
            }
            TickOutcome::RefreshDue(ticket) => {
                let _ = self.event_tx.send(NowPlayingEvent::Progress { progress });
                debug!("Refresh due (request #{})", ticket.seq());
                self.spawn_fetch(ticket);
            }
        }
    }

    fn spawn_fetch(self: &Arc<Self>, ticket: RefreshTicket) {
        let _ = self.event_tx.send(NowPlayingEvent::Loading);

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                () = engine.cancel_token.cancelled() => {
                    debug!("Dropping request #{} on shutdown", ticket.seq());
                }
                result = engine.source.fetch_status() => {
                    engine.finish_refresh(ticket, result).await;
                }
            }
        });
    }

    async fn finish_refresh(&self, ticket: RefreshTicket, result: Result<FetchedStatus>) {
        let error_message = result.as_ref().err().map(ToString::to_string);

        let (outcome, previous, snapshot_status, progress) = {
            let mut controller = self.controller.write().await;
            let previous = controller.status().cloned();
            let outcome = controller.complete_refresh(ticket, result);
            (
                outcome,
                previous,
                controller.status().cloned(),
                controller.progress(),
            )
        };

        match outcome {
            RefreshOutcome::Installed { is_playing } => {
                let Some(status) = snapshot_status else {
                    return;
                };
                if previous.is_some_and(|p| p.is_same_track(&status)) {
                    debug!(
                        "Status refreshed: playing={}, position={}ms",
                        is_playing, progress.progress_ms
                    );
                } else {
                    info!(
                        "{}: {} - {} ({}ms of {}ms)",
                        if is_playing { "Now playing" } else { "Last played" },
                        status.artist,
                        status.name,
                        progress.progress_ms,
                        status.duration_ms
                    );
                }
                let _ = self
                    .event_tx
                    .send(NowPlayingEvent::StatusLoaded { status, progress });
            }
            RefreshOutcome::Failed => {
                let message = error_message.unwrap_or_default();
                warn!("Status fetch #{} failed: {}", ticket.seq(), message);
                let _ = self.event_tx.send(NowPlayingEvent::Failed { message });
            }
            RefreshOutcome::Stale => {
                debug!("Discarding stale response for request #{}", ticket.seq());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::status::tests::sample_status;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted source. Each fetch pops the next response; when `gate` is
    /// set, fetches block until it is notified.
    struct ScriptedSource {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<Result<FetchedStatus>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<FetchedStatus>>, gate: Option<Arc<Notify>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses.into()),
                gate,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_status(&self) -> Result<FetchedStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CoreError::NoContent))
        }
    }

    fn playing(progress_ms: u64, duration_ms: u64) -> FetchedStatus {
        let mut status = sample_status(true);
        status.duration_ms = duration_ms;
        FetchedStatus {
            status,
            progress_ms,
        }
    }

    fn config() -> ControllerConfig {
        ControllerConfig {
            tick: Duration::from_millis(100),
            error_retry: Duration::from_secs(5),
            error_retry_max: Duration::from_secs(60),
            idle_refresh: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_installs_without_fetching() {
        let source = ScriptedSource::new(vec![], None);
        let engine = NowPlayingEngine::new(source.clone(), config(), None);
        engine.seed(Ok(playing(1_000, 180_000))).await;

        let handle = Arc::clone(&engine).start();
        tokio::time::sleep(Duration::from_millis(1_050)).await;

        let snapshot = engine.snapshot().await;
        assert_eq!(source.calls(), 0);
        assert_eq!(snapshot.phase, Phase::Counting);
        assert_eq!(snapshot.progress.progress_ms, 2_000);

        engine.cancel_token().cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unseeded_engine_loads_on_start() {
        let source = ScriptedSource::new(vec![Ok(playing(5_000, 180_000))], None);
        let engine = NowPlayingEngine::new(source.clone(), config(), None);

        let handle = Arc::clone(&engine).start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(source.calls(), 1);
        let snapshot = engine.snapshot().await;
        assert!(snapshot.status.is_some());
        assert!(!snapshot.view.is_loading);

        engine.cancel_token().cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_end_triggers_single_fetch() {
        let gate = Arc::new(Notify::new());
        let source = ScriptedSource::new(
            vec![Ok(playing(0, 200_000))],
            Some(Arc::clone(&gate)),
        );
        let engine = NowPlayingEngine::new(source.clone(), config(), None);
        engine.seed(Ok(playing(700, 1_000))).await;

        let handle = Arc::clone(&engine).start();

        // Many ticks land at 100% while the fetch is still pending
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(source.calls(), 1);
        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Refreshing);
        assert!(snapshot.view.is_loading);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = engine.snapshot().await;
        assert_eq!(source.calls(), 1);
        assert_eq!(snapshot.phase, Phase::Counting);
        assert_eq!(snapshot.status.map(|s| s.duration_ms), Some(200_000));

        engine.cancel_token().cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_state_retries_after_backoff() {
        let source = ScriptedSource::new(vec![Ok(playing(0, 180_000))], None);
        let engine = NowPlayingEngine::new(source.clone(), config(), None);
        engine.seed(Err(CoreError::NoContent)).await;
        assert!(engine.snapshot().await.view.is_error);

        let handle = Arc::clone(&engine).start();

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(source.calls(), 0);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(source.calls(), 1);
        let snapshot = engine.snapshot().await;
        assert!(!snapshot.view.is_error);
        assert!(snapshot.status.is_some());

        engine.cancel_token().cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_fetch_lifecycle() {
        let source = ScriptedSource::new(vec![Err(CoreError::StatusEndpoint { status: 503 })], None);
        let engine = NowPlayingEngine::new(source, config(), None);
        let mut rx = engine.subscribe();

        assert!(engine.refresh_now().await);

        assert!(matches!(rx.recv().await.unwrap(), NowPlayingEvent::Loading));
        match rx.recv().await.unwrap() {
            NowPlayingEvent::Failed { message } => assert!(message.contains("503")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(engine.snapshot().await.view.is_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now_respects_guard() {
        let gate = Arc::new(Notify::new());
        let source = ScriptedSource::new(
            vec![Ok(playing(0, 180_000))],
            Some(Arc::clone(&gate)),
        );
        let engine = NowPlayingEngine::new(source.clone(), config(), None);

        assert!(engine.refresh_now().await);
        assert!(!engine.refresh_now().await);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);
        assert!(engine.snapshot().await.status.is_some());
        assert!(engine.refresh_now().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let source = ScriptedSource::new(vec![], None);
        let engine = NowPlayingEngine::new(source, config(), None);
        engine.seed(Ok(playing(0, 180_000))).await;

        let handle = Arc::clone(&engine).start();
        engine.cancel_token().cancel();
        handle.await.unwrap();

        // No more ticks after shutdown
        let before = engine.snapshot().await.progress.progress_ms;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(engine.snapshot().await.progress.progress_ms, before);
    }
}
