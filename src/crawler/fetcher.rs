//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests to fetch page content
//! - Retry logic for transient failures
//! - Detection of JavaScript-shell pages and the render fallback
//! - HEAD probes for link status checks

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::{CrawlConfig, RenderPolicy};
use crate::render::RenderClient;
use crate::storage::FetchMethod;

/// Markers that suggest a client-side rendered application shell
const FRAMEWORK_MARKERS: &[&str] = &[
    "data-reactroot",
    "ng-app",
    "ng-version",
    "id=\"root\"",
    "id=\"app\"",
    "vue",
    "react",
    "angular",
    "__next_data__",
    "nuxt",
];

/// Block-level tags counted when judging whether a page has real content
const BLOCK_TAGS: &[&str] = &["<p", "<div", "<section", "<article", "<li", "<h1", "<h2"];

/// Result of fetching one URL
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code, 0 when the request never completed
    pub status_code: u16,
    /// How the body was obtained
    pub method: FetchMethod,
    /// Response body, present only for HTML responses
    pub body: Option<String>,
    /// Error description for failed fetches
    pub error: Option<String>,
    /// Wall time spent on the fetch
    pub elapsed_ms: u64,
}

/// Builds the HTTP client used for crawling
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_profile.ua_string())
        .timeout(Duration::from_secs(config.fetch_timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retries and the optional render fallback
pub struct Fetcher {
    client: Client,
    retries: u32,
    render_policy: RenderPolicy,
    render: Option<RenderClient>,
}

impl Fetcher {
    pub fn new(
        client: Client,
        config: &CrawlConfig,
        render: Option<RenderClient>,
    ) -> Self {
        Self {
            client,
            retries: config.fetch_retries,
            render_policy: config.render_js,
            render,
        }
    }

    /// Fetches a page, retrying transient failures
    ///
    /// Retries apply only to errors that may resolve on their own (timeouts
    /// and connection failures). HTTP error statuses are recorded as-is.
    /// When the static body looks like a JavaScript shell and rendering is
    /// enabled, the URL is rendered once; a render failure is permanent for
    /// that URL and the page is recorded as a fetch error.
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        let start = Instant::now();
        let mut last_error = String::new();

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                debug!(url = %url, attempt, "retrying fetch");
            }

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let final_url = response.url().clone();
                    let status = response.status().as_u16();
                    let is_html = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(|ct| ct.contains("text/html"))
                        .unwrap_or(true);

                    let body = if is_html {
                        match response.text().await {
                            Ok(text) => Some(text),
                            Err(e) => {
                                return FetchOutcome {
                                    final_url,
                                    status_code: status,
                                    method: FetchMethod::Static,
                                    body: None,
                                    error: Some(format!("failed to read body: {e}")),
                                    elapsed_ms: start.elapsed().as_millis() as u64,
                                };
                            }
                        }
                    } else {
                        None
                    };

                    return self
                        .maybe_render(url, final_url, status, body, start)
                        .await;
                }
                Err(e) if is_transient(&e) => {
                    last_error = e.to_string();
                }
                Err(e) => {
                    last_error = e.to_string();
                    break;
                }
            }
        }

        FetchOutcome {
            final_url: url.clone(),
            status_code: 0,
            method: FetchMethod::Static,
            body: None,
            error: Some(last_error),
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn maybe_render(
        &self,
        url: &Url,
        final_url: Url,
        status: u16,
        body: Option<String>,
        start: Instant,
    ) -> FetchOutcome {
        let shell = status == 200
            && body
                .as_deref()
                .map(looks_like_js_shell)
                .unwrap_or(false);
        let client = match (self.render.as_ref(), self.render_policy) {
            (Some(c), RenderPolicy::Always) if status == 200 && body.is_some() => Some(c),
            (Some(c), RenderPolicy::Auto) if shell => Some(c),
            _ => None,
        };

        let client = match client {
            Some(c) => c,
            None => {
                return FetchOutcome {
                    final_url,
                    status_code: status,
                    method: FetchMethod::Static,
                    body,
                    error: None,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            }
        };

        match client.render(final_url.as_str()).await {
            Ok(html) => FetchOutcome {
                final_url,
                status_code: status,
                method: FetchMethod::Rendered,
                body: Some(html),
                error: None,
                elapsed_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => {
                warn!(url = %url, error = %e, "render failed");
                FetchOutcome {
                    final_url,
                    status_code: status,
                    method: FetchMethod::Rendered,
                    body: None,
                    error: Some(e.to_string()),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            }
        }
    }

    /// Checks a URL's status with a HEAD request, no retries
    pub async fn probe_status(&self, url: &Url) -> Option<u16> {
        match self.client.head(url.clone()).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                debug!(url = %url, error = %e, "HEAD probe failed");
                None
            }
        }
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Heuristic for pages whose static HTML is an empty application shell
///
/// A page qualifies when it carries a client-side framework marker and is
/// either very small or has almost no block-level content.
pub fn looks_like_js_shell(html: &str) -> bool {
    let lower = html.to_lowercase();
    let has_marker = FRAMEWORK_MARKERS.iter().any(|m| lower.contains(m));
    if !has_marker {
        return false;
    }
    if html.len() < 1000 {
        return true;
    }
    let blocks: usize = BLOCK_TAGS.iter().map(|t| lower.matches(t).count()).sum();
    blocks < 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(render: Option<RenderClient>, policy: RenderPolicy) -> Fetcher {
        let mut config = test_config("https://example.com/");
        config.crawl.render_js = policy;
        config.crawl.fetch_retries = 1;
        let client = build_http_client(&config.crawl).unwrap();
        Fetcher::new(client, &config.crawl, render)
    }

    #[test]
    fn test_js_shell_small_framework_page() {
        let html = r#"<html><body><div id="root" data-reactroot></div></body></html>"#;
        assert!(looks_like_js_shell(html));
    }

    #[test]
    fn test_js_shell_requires_marker() {
        let html = "<html><body><div>tiny</div></body></html>";
        assert!(!looks_like_js_shell(html));
    }

    #[test]
    fn test_content_rich_page_not_shell() {
        let mut html = String::from(r#"<html><body><div id="app">"#);
        for i in 0..20 {
            html.push_str(&format!("<p>paragraph number {i} with some words</p>"));
        }
        html.push_str("</div></body></html>");
        assert!(!looks_like_js_shell(&html));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><title>Hi</title></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let f = fetcher(None, RenderPolicy::Never);
        let url = Url::parse(&server.uri()).unwrap();
        let outcome = f.fetch(&url).await;

        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.method, FetchMethod::Static);
        assert!(outcome.body.unwrap().contains("Hi"));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_non_html_has_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json"),
            )
            .mount(&server)
            .await;

        let f = fetcher(None, RenderPolicy::Never);
        let url = Url::parse(&server.uri()).unwrap();
        let outcome = f.fetch(&url).await;

        assert_eq!(outcome.status_code, 200);
        assert!(outcome.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_connection_error() {
        let f = fetcher(None, RenderPolicy::Never);
        // Port 1 is never listening locally
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let outcome = f.fetch(&url).await;

        assert_eq!(outcome.status_code, 0);
        assert!(outcome.body.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_render_fallback_replaces_shell_body() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"<html><div id="root" data-reactroot></div></html>"#, "text/html"),
            )
            .mount(&site)
            .await;

        let renderer = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><h1>Rendered</h1></html>"),
            )
            .mount(&renderer)
            .await;

        let f = fetcher(
            Some(RenderClient::with_endpoint(&renderer.uri())),
            RenderPolicy::Auto,
        );
        let url = Url::parse(&site.uri()).unwrap();
        let outcome = f.fetch(&url).await;

        assert_eq!(outcome.method, FetchMethod::Rendered);
        assert!(outcome.body.unwrap().contains("Rendered"));
    }

    #[tokio::test]
    async fn test_render_failure_is_permanent_error() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"<html><div id="root" data-reactroot></div></html>"#, "text/html"),
            )
            .mount(&site)
            .await;

        let renderer = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&renderer)
            .await;

        let f = fetcher(
            Some(RenderClient::with_endpoint(&renderer.uri())),
            RenderPolicy::Auto,
        );
        let url = Url::parse(&site.uri()).unwrap();
        let outcome = f.fetch(&url).await;

        assert_eq!(outcome.method, FetchMethod::Rendered);
        assert!(outcome.body.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_probe_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fetcher(None, RenderPolicy::Never);
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        assert_eq!(f.probe_status(&url).await, Some(404));
    }
}
