//! Robots.txt fetching, caching, and sitemap discovery
//!
//! Rules are fetched once per host and cached for the lifetime of the
//! crawl. A missing or unfetchable robots.txt degrades to allow-all so
//! the crawl can proceed.

mod parser;

pub use parser::RobotsRules;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::crawler::rate_limit::TokenBucket;

/// Maximum sitemap documents fetched during discovery, including nested
/// sitemap index entries.
const MAX_SITEMAP_FETCHES: usize = 10;

/// Maximum URLs collected from sitemap discovery.
const MAX_SITEMAP_URLS: usize = 500;

/// Per-crawl cache of robots.txt rules keyed by host
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    bucket: Arc<TokenBucket>,
    entries: Mutex<HashMap<String, RobotsRules>>,
}

impl RobotsCache {
    /// Creates an empty cache using the given HTTP client and user agent.
    /// Fetches on cache miss take a token from the crawl-wide bucket.
    pub fn new(client: Client, user_agent: String, bucket: Arc<TokenBucket>) -> Self {
        Self {
            client,
            user_agent,
            bucket,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached rules for the URL's host, fetching on first use
    pub async fn rules_for(&self, url: &Url) -> RobotsRules {
        let host = match url.host_str() {
            Some(h) => h.to_string(),
            None => return RobotsRules::allow_all(),
        };

        {
            let entries = self.entries.lock().await;
            if let Some(rules) = entries.get(&host) {
                return rules.clone();
            }
        }

        let rules = self.fetch_rules(url, &host).await;
        let mut entries = self.entries.lock().await;
        entries.entry(host).or_insert_with(|| rules.clone());
        rules
    }

    /// Checks whether the URL may be fetched under the host's robots rules
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let rules = self.rules_for(url).await;
        rules.allows(url.as_str(), &self.user_agent)
    }

    async fn fetch_rules(&self, url: &Url, host: &str) -> RobotsRules {
        let robots_url = match url.port() {
            Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
            None => format!("{}://{}/robots.txt", url.scheme(), host),
        };

        self.bucket.acquire().await;
        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    debug!(host, "fetched robots.txt");
                    RobotsRules::from_content(&body)
                }
                Err(e) => {
                    warn!(host, error = %e, "failed to read robots.txt body, allowing all");
                    RobotsRules::allow_all()
                }
            },
            Ok(response) => {
                debug!(host, status = %response.status(), "no robots.txt, allowing all");
                RobotsRules::allow_all()
            }
            Err(e) => {
                warn!(host, error = %e, "failed to fetch robots.txt, allowing all");
                RobotsRules::allow_all()
            }
        }
    }
}

/// Fetches sitemap documents and collects the page URLs they declare
///
/// Nested sitemap index files are followed one level deep. Fetch and URL
/// counts are bounded so a pathological sitemap cannot stall the crawl.
pub async fn discover_sitemap_urls(
    client: &Client,
    bucket: &TokenBucket,
    sitemap_urls: &[String],
) -> Vec<String> {
    let mut collected = Vec::new();
    let mut queue: Vec<String> = sitemap_urls.to_vec();
    let mut fetches = 0;

    while let Some(sitemap_url) = queue.pop() {
        if fetches >= MAX_SITEMAP_FETCHES || collected.len() >= MAX_SITEMAP_URLS {
            break;
        }
        fetches += 1;

        bucket.acquire().await;
        let body = match client.get(&sitemap_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %sitemap_url, error = %e, "failed to read sitemap body");
                    continue;
                }
            },
            Ok(response) => {
                debug!(url = %sitemap_url, status = %response.status(), "sitemap not available");
                continue;
            }
            Err(e) => {
                warn!(url = %sitemap_url, error = %e, "failed to fetch sitemap");
                continue;
            }
        };

        let locs = extract_locs(&body);
        if body.contains("<sitemapindex") {
            // Index file, entries point at further sitemap documents
            queue.extend(locs);
        } else {
            for loc in locs {
                if collected.len() >= MAX_SITEMAP_URLS {
                    break;
                }
                collected.push(loc);
            }
        }
    }

    debug!(count = collected.len(), "sitemap discovery complete");
    collected
}

/// Extracts the text of every `<loc>` element in a sitemap document
fn extract_locs(xml: &str) -> Vec<String> {
    let mut locs = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<loc>") {
        rest = &rest[start + 5..];
        if let Some(end) = rest.find("</loc>") {
            let loc = rest[..end].trim();
            if !loc.is_empty() {
                locs.push(loc.to_string());
            }
            rest = &rest[end + 6..];
        } else {
            break;
        }
    }
    locs
}
