use crate::components::NowPlayingCard;
use dioxus::prelude::*;
use islistening_core::NowPlayingEngine;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// Root application component.
/// Renders the now-playing card; pressing `R` refreshes the status.
#[component]
pub fn App() -> Element {
    let engine: Arc<NowPlayingEngine> = use_context();
    let runtime: Handle = use_context();

    let on_key_down = move |evt: KeyboardEvent| {
        let is_refresh_key = matches!(evt.key(), Key::Character(ref c) if c.eq_ignore_ascii_case("r"))
            || evt.key() == Key::F5;
        if !is_refresh_key {
            return;
        }

        // Fetches run on the engine's runtime, not the UI executor
        let engine = Arc::clone(&engine);
        runtime.spawn(async move {
            if !engine.refresh_now().await {
                debug!("Refresh already in progress");
            }
        });
    };

    rsx! {
        div {
            class: "page",
            tabindex: "0",
            autofocus: true,
            onkeydown: on_key_down,

            NowPlayingCard {}
        }
    }
}
