//! Page Content Features
//!
//! Heuristics over a fetched HTML document. All host comparisons are made
//! against the host of the submitted URL, not the post-redirect one.
//! Relative references always count as same-host.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::layout::Feature;
use super::network::FetchedPage;
use super::reputation::is_well_known;
use super::structure::UrlTarget;
use super::vector::{FeatureExtractor, PartialVector};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// HTTPS share of absolute links at or below this is flagged
pub const HTTPS_LINK_RATIO: f64 = 0.5;
/// Cross-host share of requested resources
pub const REQUEST_URL_RATIO: f64 = 0.25;
/// Cross-host share of anchors
pub const ANCHOR_URL_RATIO: f64 = 0.31;
/// Cross-host share of external scripts
pub const SCRIPT_LINK_RATIO: f64 = 0.17;

// ============================================================================
// SELECTORS
// ============================================================================

static LINKS: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("link").ok());
static LINKED_ELEMENTS: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse("a, img, script, link").ok());
static RESOURCES: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse("img, script, link, iframe").ok());
static ANCHORS: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("a[href]").ok());
static EXTERNAL_SCRIPTS: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse("script[src]").ok());
static SCRIPTS: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("script").ok());
static FORMS: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("form[action]").ok());
static IFRAMES: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("iframe").ok());

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").ok()
});

// ============================================================================
// HELPERS
// ============================================================================

/// Absolute `http*` reference pointing somewhere other than `host`
fn is_cross_host(reference: &str, host: &str) -> bool {
    if !reference.starts_with("http") {
        return false;
    }
    match Url::parse(reference) {
        Ok(url) => url.host_str().map_or(true, |h| !h.eq_ignore_ascii_case(host)),
        Err(_) => true,
    }
}

/// First non-empty of two attributes
fn attr_either<'a>(el: &ElementRef<'a>, first: &str, second: &str) -> Option<&'a str> {
    el.value()
        .attr(first)
        .filter(|v| !v.is_empty())
        .or_else(|| el.value().attr(second).filter(|v| !v.is_empty()))
}

fn flag(condition: bool) -> Option<u8> {
    Some(u8::from(condition))
}

/// 1 when the cross-host share exceeds `limit`, 1 when there is nothing to count
fn ratio_flag(external: usize, total: usize, limit: f64) -> Option<u8> {
    if total == 0 {
        return Some(1);
    }
    flag(external as f64 / total as f64 > limit)
}

/// Host shape checks used when the page was reachable
pub fn abnormal_url(host: &str) -> u8 {
    if is_well_known(host) {
        return 0;
    }
    let compact = host.replace(['.', '-'], "");
    let first = host.split('.').next().unwrap_or_default();
    let abnormal = compact.len() < 3
        || host.matches('-').count() > 3
        || host.matches('.').count() > 4
        || (first.len() < 6 && first.chars().any(|c| c.is_ascii_digit()));
    u8::from(abnormal)
}

// ============================================================================
// PARSED PAGE
// ============================================================================

/// A parsed HTML document plus the host it was requested for
pub struct PageContent {
    html: Html,
    host: String,
}

impl PageContent {
    pub fn parse(body: &str, host: &str) -> Self {
        Self {
            html: Html::parse_document(body),
            host: host.to_ascii_lowercase(),
        }
    }

    fn select<'a>(
        &'a self,
        selector: &'a Lazy<Option<Selector>>,
    ) -> Option<impl Iterator<Item = ElementRef<'a>> + 'a> {
        let selector = selector.as_ref()?;
        Some(self.html.select(selector))
    }

    /// Favicon served from another host
    pub fn favicon(&self) -> Option<u8> {
        let base = Url::parse(&format!("http://{}/", self.host)).ok()?;
        let external = self.select(&LINKS)?.any(|link| {
            let is_icon = link
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"));
            let href = link.value().attr("href").unwrap_or_default();
            if !is_icon || href.is_empty() || href.starts_with("data:") {
                return false;
            }
            match base.join(href) {
                Ok(resolved) => resolved
                    .host_str()
                    .map_or(true, |h| !h.eq_ignore_ascii_case(&self.host)),
                Err(_) => false,
            }
        });
        flag(external)
    }

    /// Low share of HTTPS among absolute links
    pub fn https_domain_url(&self) -> Option<u8> {
        let mut https = 0usize;
        let mut total = 0usize;
        for el in self.select(&LINKED_ELEMENTS)? {
            if let Some(reference) = attr_either(&el, "href", "src") {
                if reference.starts_with("http") {
                    total += 1;
                    if reference.starts_with("https") {
                        https += 1;
                    }
                }
            }
        }
        if total == 0 {
            return Some(1);
        }
        flag(https as f64 / total as f64 <= HTTPS_LINK_RATIO)
    }

    /// Share of resources loaded from other hosts
    pub fn request_url(&self) -> Option<u8> {
        let mut external = 0usize;
        let mut total = 0usize;
        for el in self.select(&RESOURCES)? {
            if let Some(reference) = attr_either(&el, "src", "href") {
                total += 1;
                if is_cross_host(reference, &self.host) {
                    external += 1;
                }
            }
        }
        ratio_flag(external, total, REQUEST_URL_RATIO)
    }

    /// Share of anchors pointing to other hosts
    pub fn anchor_url(&self) -> Option<u8> {
        let mut external = 0usize;
        let mut total = 0usize;
        for anchor in self.select(&ANCHORS)? {
            total += 1;
            let href = anchor.value().attr("href").unwrap_or_default();
            if is_cross_host(href, &self.host) {
                external += 1;
            }
        }
        ratio_flag(external, total, ANCHOR_URL_RATIO)
    }

    /// Share of external scripts served from other hosts
    pub fn links_in_script_tags(&self) -> Option<u8> {
        let mut external = 0usize;
        let mut total = 0usize;
        for script in self.select(&EXTERNAL_SCRIPTS)? {
            total += 1;
            let src = script.value().attr("src").unwrap_or_default();
            if is_cross_host(src, &self.host) {
                external += 1;
            }
        }
        ratio_flag(external, total, SCRIPT_LINK_RATIO)
    }

    /// A form submits to another host
    pub fn server_form_handler(&self) -> Option<u8> {
        let external = self.select(&FORMS)?.any(|form| {
            let action = form.value().attr("action").unwrap_or_default();
            is_cross_host(action, &self.host)
        });
        flag(external)
    }

    /// 0 when the page text contains an email address
    pub fn info_email(&self) -> Option<u8> {
        let pattern = EMAIL.as_ref()?;
        let text: String = self.html.root_element().text().collect();
        flag(!pattern.is_match(&text))
    }

    fn inline_script_matches(&self, matches: impl Fn(&str) -> bool) -> Option<u8> {
        let found = self.select(&SCRIPTS)?.any(|script| {
            let body: String = script.text().collect();
            !body.is_empty() && matches(&body)
        });
        flag(found)
    }

    pub fn status_bar_customization(&self) -> Option<u8> {
        self.inline_script_matches(|body| {
            let lower = body.to_lowercase();
            lower.contains("status") || lower.contains("defaultstatus")
        })
    }

    pub fn disable_right_click(&self) -> Option<u8> {
        self.inline_script_matches(|body| body.to_lowercase().contains("contextmenu"))
    }

    pub fn using_popup_window(&self) -> Option<u8> {
        self.inline_script_matches(|body| {
            body.contains("window.open") || body.to_lowercase().contains("popup")
        })
    }

    pub fn iframe_redirection(&self) -> Option<u8> {
        flag(self.select(&IFRAMES)?.next().is_some())
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Content feature group for a page fetched for `target`
pub struct ContentFeatures<'a> {
    target: &'a UrlTarget,
}

impl<'a> ContentFeatures<'a> {
    pub fn new(target: &'a UrlTarget) -> Self {
        Self { target }
    }
}

impl FeatureExtractor<FetchedPage> for ContentFeatures<'_> {
    fn extract(&self, page: &FetchedPage, partial: &mut PartialVector) {
        let host = self.target.host();
        let content = PageContent::parse(&page.body, host);

        let forwarded = page
            .final_url
            .host_str()
            .map_or(true, |h| !h.eq_ignore_ascii_case(host));

        partial.set(Feature::Favicon, content.favicon());
        partial.set(Feature::HttpsDomainUrl, content.https_domain_url());
        partial.set(Feature::RequestUrl, content.request_url());
        partial.set(Feature::AnchorUrl, content.anchor_url());
        partial.set(Feature::LinksInScriptTags, content.links_in_script_tags());
        partial.set(Feature::ServerFormHandler, content.server_form_handler());
        partial.set(Feature::InfoEmail, content.info_email());
        partial.set(Feature::AbnormalUrl, Some(abnormal_url(host)));
        partial.set(Feature::WebsiteForwarding, flag(forwarded));
        partial.set(Feature::StatusBarCust, content.status_bar_customization());
        partial.set(Feature::DisableRightClick, content.disable_right_click());
        partial.set(Feature::UsingPopupWindow, content.using_popup_window());
        partial.set(Feature::IframeRedirection, content.iframe_redirection());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> PageContent {
        PageContent::parse(body, "example.com")
    }

    #[test]
    fn test_cross_host() {
        assert!(is_cross_host("https://evil.com/x", "example.com"));
        assert!(!is_cross_host("https://EXAMPLE.com/x", "example.com"));
        assert!(!is_cross_host("/relative/path", "example.com"));
        assert!(!is_cross_host("mailto:a@b.com", "example.com"));
    }

    #[test]
    fn test_favicon() {
        assert_eq!(page(r#"<link rel="icon" href="/favicon.ico">"#).favicon(), Some(0));
        assert_eq!(
            page(r#"<link rel="Shortcut Icon" href="https://cdn.other.net/f.ico">"#).favicon(),
            Some(1)
        );
        assert_eq!(page(r#"<link rel="icon" href="data:image/png;base64,AA">"#).favicon(), Some(0));
        assert_eq!(page("<p>no icon</p>").favicon(), Some(0));
    }

    #[test]
    fn test_https_domain_url() {
        let mostly_https = r#"<a href="https://a.com">a</a><img src="https://b.com/i.png"><a href="http://c.com">c</a>"#;
        assert_eq!(page(mostly_https).https_domain_url(), Some(0));

        let half = r#"<a href="https://a.com">a</a><a href="http://c.com">c</a>"#;
        assert_eq!(page(half).https_domain_url(), Some(1));

        assert_eq!(page(r#"<a href="/local">x</a>"#).https_domain_url(), Some(1));
    }

    #[test]
    fn test_request_url() {
        let local = r#"<img src="/a.png"><script src="/app.js"></script><link href="/s.css"><img src="https://cdn.io/b.png">"#;
        assert_eq!(page(local).request_url(), Some(0));

        let foreign = r#"<img src="/a.png"><img src="https://cdn.io/b.png"><iframe src="https://x.io"></iframe>"#;
        assert_eq!(page(foreign).request_url(), Some(1));

        assert_eq!(page("<p>text</p>").request_url(), Some(1));
    }

    #[test]
    fn test_anchor_url() {
        let body = r##"<a href="/a">1</a><a href="#top">2</a><a href="https://example.com/c">3</a><a href="https://other.org">4</a>"##;
        assert_eq!(page(body).anchor_url(), Some(0));

        let body = r#"<a href="/a">1</a><a href="https://other.org">2</a>"#;
        assert_eq!(page(body).anchor_url(), Some(1));
    }

    #[test]
    fn test_links_in_script_tags() {
        let body = r#"<script src="/a.js"></script><script src="/b.js"></script><script src="/c.js"></script><script src="/d.js"></script><script src="/e.js"></script><script src="https://cdn.io/f.js"></script>"#;
        assert_eq!(page(body).links_in_script_tags(), Some(0));

        let body = r#"<script src="/a.js"></script><script src="https://cdn.io/f.js"></script>"#;
        assert_eq!(page(body).links_in_script_tags(), Some(1));

        assert_eq!(page("<script>var x;</script>").links_in_script_tags(), Some(1));
    }

    #[test]
    fn test_server_form_handler() {
        assert_eq!(page(r#"<form action="/login"></form>"#).server_form_handler(), Some(0));
        assert_eq!(
            page(r#"<form action="https://collector.ru/post"></form>"#).server_form_handler(),
            Some(1)
        );
    }

    #[test]
    fn test_info_email() {
        assert_eq!(page("<p>Contact support@example.com</p>").info_email(), Some(0));
        assert_eq!(page("<p>No contact here</p>").info_email(), Some(1));
    }

    #[test]
    fn test_script_heuristics() {
        let body = r#"<script>window.status = 'Done'; document.oncontextmenu = f; window.open('x');</script>"#;
        let content = page(body);
        assert_eq!(content.status_bar_customization(), Some(1));
        assert_eq!(content.disable_right_click(), Some(1));
        assert_eq!(content.using_popup_window(), Some(1));

        let content = page("<script>console.log('hi')</script>");
        assert_eq!(content.status_bar_customization(), Some(0));
        assert_eq!(content.disable_right_click(), Some(0));
        assert_eq!(content.using_popup_window(), Some(0));
    }

    #[test]
    fn test_popup_window_open_is_case_sensitive() {
        assert_eq!(page("<script>WINDOW.OPEN('x')</script>").using_popup_window(), Some(0));
        assert_eq!(page("<script>showPopUp()</script>").using_popup_window(), Some(1));
    }

    #[test]
    fn test_iframe() {
        assert_eq!(page(r#"<iframe src="/x"></iframe>"#).iframe_redirection(), Some(1));
        assert_eq!(page("<div></div>").iframe_redirection(), Some(0));
    }

    #[test]
    fn test_abnormal_url() {
        assert_eq!(abnormal_url("www.google.com"), 0);
        assert_eq!(abnormal_url("example.com"), 0);
        assert_eq!(abnormal_url("ab"), 1);
        assert_eq!(abnormal_url("a-b-c-d-e.com"), 1);
        assert_eq!(abnormal_url("a.b.c.d.e.f"), 1);
        assert_eq!(abnormal_url("ex4m.com"), 1);
        assert_eq!(abnormal_url("example4.com"), 0);
    }
}
