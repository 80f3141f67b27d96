//! BFS frontier with visited tracking and external budgets
//!
//! The frontier is a FIFO queue of URLs awaiting fetch. URLs are marked
//! visited at admission time, not at fetch time, so a URL discovered on
//! two pages concurrently is only ever queued once. External URLs are
//! admitted against a per-crawl budget counted by registrable domain.

use std::collections::{HashSet, VecDeque};

use url::Url;

use crate::config::CrawlConfig;
use crate::url::{is_blacklisted, is_internal, registrable_domain, should_fetch};

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
    pub is_external: bool,
    /// Navigation score of the link that discovered this URL
    pub nav_score: i64,
    /// Anchor text of the discovering link, None for the seed
    pub anchor_text: Option<String>,
    /// URL of the page that discovered this one, None for the seed
    pub source_url: Option<Url>,
}

/// Why a candidate URL was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Already visited or queued
    AlreadySeen,
    /// Past the depth limit for its class
    TooDeep,
    /// Registrable domain is on the blacklist
    Blacklisted,
    /// Non-fetchable scheme or a skipped file extension
    NotFetchable,
    /// External link while external following is disabled
    ExternalDisabled,
    /// The external domain budget is spent
    ExternalBudgetExhausted,
}

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { is_external: bool },
    Rejected(Rejection),
}

/// FIFO crawl frontier
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    external_domains: HashSet<String>,
    seed_domain: String,
    internal_depth: u32,
    external_depth: u32,
    follow_external: bool,
    max_external: usize,
}

impl Frontier {
    /// Creates a frontier for a crawl of the given seed domain
    pub fn new(seed_domain: &str, config: &CrawlConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            external_domains: HashSet::new(),
            seed_domain: seed_domain.to_string(),
            internal_depth: config.internal_depth,
            external_depth: config.external_depth,
            follow_external: config.follow_external_links,
            max_external: config.max_external_links,
        }
    }

    /// Offers a normalized URL for admission
    ///
    /// Admitted URLs are marked visited immediately so later offers of the
    /// same URL are rejected as duplicates.
    pub fn offer(&mut self, url: Url, depth: u32, nav_score: i64) -> Admission {
        self.offer_discovered(url, depth, nav_score, None, None)
    }

    /// Offers a URL discovered by a link, keeping its discovery context
    pub fn offer_discovered(
        &mut self,
        url: Url,
        depth: u32,
        nav_score: i64,
        anchor_text: Option<String>,
        source_url: Option<Url>,
    ) -> Admission {
        if self.visited.contains(url.as_str()) {
            return Admission::Rejected(Rejection::AlreadySeen);
        }
        if !should_fetch(&url) {
            return Admission::Rejected(Rejection::NotFetchable);
        }
        if is_blacklisted(&url) {
            return Admission::Rejected(Rejection::Blacklisted);
        }

        let internal = is_internal(&url, &self.seed_domain);
        if internal {
            if depth > self.internal_depth {
                return Admission::Rejected(Rejection::TooDeep);
            }
        } else {
            if !self.follow_external {
                return Admission::Rejected(Rejection::ExternalDisabled);
            }
            if depth > self.external_depth {
                return Admission::Rejected(Rejection::TooDeep);
            }
            let domain = match registrable_domain(&url) {
                Some(d) => d,
                None => return Admission::Rejected(Rejection::NotFetchable),
            };
            if !self.external_domains.contains(&domain)
                && self.external_domains.len() >= self.max_external
            {
                return Admission::Rejected(Rejection::ExternalBudgetExhausted);
            }
            self.external_domains.insert(domain);
        }

        self.visited.insert(url.as_str().to_string());
        self.queue.push_back(FrontierEntry {
            url,
            depth,
            is_external: !internal,
            nav_score,
            anchor_text,
            source_url,
        });
        Admission::Admitted {
            is_external: !internal,
        }
    }

    /// Takes the next URL in FIFO order
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Whether a URL has already been admitted
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs admitted so far, queued or already fetched
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
