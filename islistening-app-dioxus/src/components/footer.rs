use crate::components::ExternalLink;
use dioxus::prelude::*;
use islistening_core::PageConfig;

const DIOXUS_URL: &str = "https://dioxuslabs.com/";

#[component]
pub fn Footer() -> Element {
    let page = use_context::<PageConfig>();

    rsx! {
        div {
            class: "footer",
            "Built with \u{1F496} using "
            ExternalLink { href: DIOXUS_URL.to_string(), "Dioxus" }
            ", code on "
            ExternalLink { href: page.source_url, "Github" }
        }
    }
}
