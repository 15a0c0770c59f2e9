use crate::state::NowPlayingState;
use dioxus::prelude::*;
use islistening_core::{NowPlayingEngine, NowPlayingEvent};
use std::sync::Arc;
use tracing::{debug, info};

const LOG_TARGET: &str = "islistening::bridge";

/// Bridge `NowPlayingEngine` events to Dioxus signals.
/// This function spawns an async task that listens to engine events
/// and updates the now-playing state signals accordingly.
pub fn use_engine_bridge(engine: Arc<NowPlayingEngine>, state: NowPlayingState) {
    use_future(move || {
        let engine = engine.clone();
        async move {
            let mut rx = engine.subscribe();

            loop {
                match rx.recv().await {
                    Ok(event) => {
                        handle_engine_event(event, state);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Engine event channel closed");
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(target: LOG_TARGET, "Missed {} engine events, resyncing", n);
                        let mut state = state;
                        state.sync(&engine.snapshot().await);
                    }
                }
            }
        }
    });
}

fn handle_engine_event(event: NowPlayingEvent, mut state: NowPlayingState) {
    match event {
        NowPlayingEvent::Loading => {
            state.set_loading();
        }
        NowPlayingEvent::StatusLoaded { status, progress } => {
            state.install(status, progress);
        }
        NowPlayingEvent::Progress { progress } => {
            state.set_progress(progress);
        }
        NowPlayingEvent::Failed { .. } => {
            // Already logged by the engine
            state.fail();
        }
    }
}
