//! Page-view analytics tag.
//!
//! Initialized once at startup; a missing id turns analytics off.

use serde_json::json;
use tracing::info;

const LOADER_BASE_URL: &str = "https://www.googletagmanager.com/gtag/js?id=";

/// Page the view is reported as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub location: String,
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsTag {
    tracking_id: String,
}

impl AnalyticsTag {
    /// Enable analytics for `tracking_id`. Absent or blank ids disable it.
    #[must_use]
    pub fn init(tracking_id: Option<&str>) -> Option<Self> {
        match tracking_id.map(str::trim) {
            Some(id) if !id.is_empty() => {
                info!("Analytics enabled ({id})");
                Some(Self {
                    tracking_id: id.to_string(),
                })
            }
            _ => {
                info!("Analytics disabled: no tracking id configured");
                None
            }
        }
    }

    #[must_use]
    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    /// URL of the tag loader script
    #[must_use]
    pub fn loader_url(&self) -> String {
        let id: String = url::form_urlencoded::byte_serialize(self.tracking_id.as_bytes()).collect();
        format!("{LOADER_BASE_URL}{id}")
    }

    /// Inline script that queues the page view.
    ///
    /// Every value goes through JSON encoding, and `</` is escaped so the
    /// script cannot close its own `<script>` element.
    #[must_use]
    pub fn bootstrap_script(&self, page: &PageContext) -> String {
        let id = json!(self.tracking_id).to_string();
        let params = json!({
            "page_location": page.location,
            "page_path": page.path,
            "page_title": page.title,
        })
        .to_string();

        let script = format!(
            "window.dataLayer = window.dataLayer || [];\n\
             function gtag(){{dataLayer.push(arguments);}}\n\
             gtag('js', new Date());\n\
             gtag('config', {id}, {params});\n"
        );
        script.replace("</", "<\\/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageContext {
        PageContext {
            location: "https://islistening.example.com/".into(),
            path: "/".into(),
            title: "What is Raed playing".into(),
        }
    }

    #[test]
    fn test_init_disabled_without_id() {
        assert!(AnalyticsTag::init(None).is_none());
        assert!(AnalyticsTag::init(Some("")).is_none());
        assert!(AnalyticsTag::init(Some("   ")).is_none());
    }

    #[test]
    fn test_init_trims_id() {
        let tag = AnalyticsTag::init(Some(" G-ABC123 ")).unwrap();
        assert_eq!(tag.tracking_id(), "G-ABC123");
    }

    #[test]
    fn test_loader_url() {
        let tag = AnalyticsTag::init(Some("G-ABC123")).unwrap();
        assert_eq!(
            tag.loader_url(),
            "https://www.googletagmanager.com/gtag/js?id=G-ABC123"
        );
    }

    #[test]
    fn test_loader_url_encodes_id() {
        let tag = AnalyticsTag::init(Some("a&b=c")).unwrap();
        assert!(tag.loader_url().ends_with("?id=a%26b%3Dc"));
    }

    #[test]
    fn test_bootstrap_script_configures_page() {
        let tag = AnalyticsTag::init(Some("G-ABC123")).unwrap();
        let script = tag.bootstrap_script(&page());

        assert!(script.contains("window.dataLayer = window.dataLayer || [];"));
        assert!(script.contains("gtag('js', new Date());"));
        assert!(script.contains("gtag('config', \"G-ABC123\", {"));
        assert!(script.contains("\"page_path\":\"/\""));
        assert!(script.contains("\"page_title\":\"What is Raed playing\""));
    }

    #[test]
    fn test_bootstrap_script_escapes_values() {
        let tag = AnalyticsTag::init(Some("x'); alert(1); //")).unwrap();
        let mut page = page();
        page.title = "</script><script>alert(1)</script>".into();

        let script = tag.bootstrap_script(&page);
        assert!(!script.contains("</script>"));
        assert!(script.contains("\"x'); alert(1); //\""));
    }
}
