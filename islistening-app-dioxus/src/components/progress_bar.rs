use dioxus::prelude::*;
use islistening_core::ProgressView;

/// Filled bar plus elapsed/total labels for a playing track.
#[component]
pub fn ProgressBar(progress: ProgressView) -> Element {
    let bar_style = progress.bar_style();

    rsx! {
        div {
            class: "progress-container",
            div {
                class: "progress",
                style: "{bar_style}",
            }
            div {
                class: "timer",
                div { "{progress.elapsed}" }
                div { "{progress.total}" }
            }
        }
    }
}
