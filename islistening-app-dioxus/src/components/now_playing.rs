use crate::components::{ExternalLink, Footer, ProgressBar};
use crate::state::NowPlayingState;
use dioxus::prelude::*;
use islistening_core::view::render;
use islistening_core::{ColorTinter, NowPlayingView, PageConfig};
use std::sync::Arc;

/// The whole page: apology, loading placeholder, or the track card over its
/// tinted background.
#[component]
pub fn NowPlayingCard() -> Element {
    let state = use_context::<NowPlayingState>();
    let tinter = use_context::<Arc<ColorTinter>>();
    let page = use_context::<PageConfig>();

    let view_state = *state.view.read();
    let progress = *state.progress.read();
    let status = state.status.read();
    let view = render(
        &view_state,
        Option::as_ref(&status),
        progress,
        &tinter,
        &page,
    );

    match view {
        NowPlayingView::Error(error) => rsx! {
            div {
                class: "container",
                div {
                    class: "loading",
                    h1 { "{error.title}" }
                    "{error.message} "
                    ExternalLink { href: error.link_url, "{error.link_label}" }
                    "."
                }
            }
        },
        NowPlayingView::Loading => rsx! {
            div {
                class: "container",
                div { class: "loading", "Loading..." }
            }
        },
        NowPlayingView::Track(track) => {
            let live = track.is_live();

            rsx! {
                div {
                    class: if track.is_loading { "container refreshing" } else { "container" },
                    h1 { class: "heading", "I'm listening to" }
                    div {
                        class: "title",
                        if live {
                            div { class: "live" }
                        }
                        "I'm listening to"
                    }
                    div {
                        class: "image-container",
                        ExternalLink {
                            href: track.track_url,
                            img {
                                class: "image",
                                src: "{track.image_url}",
                                alt: "cover",
                            }
                        }
                        div {
                            class: "info",
                            div { class: "name", "{track.name}" }
                            div { class: "artist", "{track.artist}" }
                            if let Some(progress) = track.progress {
                                ProgressBar { progress }
                            }
                        }
                    }
                    Footer {}
                }
                div {
                    class: "background",
                    style: "background-color: {track.background};",
                }
            }
        }
    }
}
