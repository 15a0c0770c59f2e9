use dioxus::prelude::*;
use tracing::warn;

/// Anchor that opens its target in the system browser instead of navigating
/// the webview.
#[component]
pub fn ExternalLink(
    href: String,
    #[props(default)] class: String,
    children: Element,
) -> Element {
    let target = href.clone();

    rsx! {
        a {
            class: "{class}",
            href: "{href}",
            rel: "noopener",
            onclick: move |evt: MouseEvent| {
                evt.prevent_default();
                if let Err(e) = open::that(&target) {
                    warn!("Failed to open {}: {}", target, e);
                }
            },
            {children}
        }
    }
}
