//! Crawl orchestration
//!
//! The orchestrator owns one crawl end to end: it drives the status state
//! machine, spawns the worker pool, applies rate limiting and cooperative
//! cancellation, feeds results to the persistence batcher, and runs the
//! post-crawl link resolution and issue passes.
//!
//! Termination is cooperative. Workers check the cancellation flag, the
//! deadline, and the page budget between dispatches; an in-flight fetch is
//! never aborted but is bounded by the fetch timeout. When all workers
//! have stopped (or the grace period expires) the remaining batched writes
//! are flushed and the crawl transitions to its terminal status.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::batcher::PersistenceBatcher;
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::{is_primary_path, parse_page, PageExtract};
use crate::crawler::rate_limit::TokenBucket;
use crate::issues::run_issue_engine;
use crate::render::RenderClient;
use crate::robots::{discover_sitemap_urls, RobotsCache};
use crate::storage::{
    CrawlStatus, FetchMethod, NewImage, NewLink, NewPage, PageUnit, Storage,
};
use crate::url::{is_internal, normalize_url, registrable_domain};
use crate::{Result, SitecheckError};

/// Links scoring at or above this are flagged as navigation links
const NAV_SCORE_THRESHOLD: i64 = 5;

/// Page units buffered before the batcher flushes
const BATCH_SIZE: usize = 20;

/// Interval of the timer-driven batch flush
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// How long an idle worker waits before re-checking the frontier
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Final state of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub crawl_id: i64,
    pub status: CrawlStatus,
    pub total_pages: u64,
    pub issues: usize,
}

/// Requests cooperative cancellation of a running crawl
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// State shared by every worker in the pool
struct Shared<S: Storage> {
    crawl_id: i64,
    seed_domain: String,
    respect_robots: bool,
    max_pages: u64,
    deadline: Instant,
    frontier: Mutex<Frontier>,
    bucket: Arc<TokenBucket>,
    fetcher: Fetcher,
    robots: RobotsCache,
    batcher: PersistenceBatcher<S>,
    storage: Arc<Mutex<S>>,
    in_flight: AtomicUsize,
    fetched: AtomicU64,
    /// Highest navigation score seen per target URL, applied after the crawl
    nav_bumps: Mutex<HashMap<String, i64>>,
    /// Probe results per image URL, shared so each image is dialed once
    image_broken: tokio::sync::Mutex<HashMap<String, bool>>,
}

/// Owns the execution of one crawl
pub struct Orchestrator<S: Storage + Send + 'static> {
    config: Config,
    storage: Arc<Mutex<S>>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl<S: Storage + Send + 'static> Orchestrator<S> {
    pub fn new(config: Config, storage: Arc<Mutex<S>>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            config,
            storage,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Handle for cancelling this crawl from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Runs the crawl to a terminal status
    ///
    /// Any internal error marks the crawl failed with a reason before
    /// propagating.
    pub async fn run(self, crawl_id: i64) -> Result<CrawlOutcome> {
        let storage = Arc::clone(&self.storage);
        match self.execute(crawl_id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let reason = e.to_string();
                if let Ok(mut guard) = storage.lock() {
                    let _ = guard.update_crawl_status(crawl_id, CrawlStatus::Failed, Some(&reason));
                }
                Err(e)
            }
        }
    }

    async fn execute(self, crawl_id: i64) -> Result<CrawlOutcome> {
        let crawl_cfg = &self.config.crawl;
        let seed = normalize_url(&crawl_cfg.seed_url)?;
        let seed_domain = registrable_domain(&seed).ok_or(crate::UrlError::MissingDomain)?;

        {
            let mut guard = lock(&self.storage);
            let current = guard.get_crawl(crawl_id)?;
            if !guard.update_crawl_status(crawl_id, CrawlStatus::Running, None)? {
                return Err(SitecheckError::InvalidTransition {
                    from: current.status,
                    to: CrawlStatus::Running,
                });
            }
        }
        info!(crawl_id, seed = %seed, "crawl started");

        let client = build_http_client(crawl_cfg)?;
        let render = RenderClient::from_config(&self.config.render)?;
        // One bucket covers every request the crawl makes, robots.txt and
        // sitemap fetches included
        let bucket = Arc::new(TokenBucket::new(crawl_cfg.rate_limit_rps));
        let robots = RobotsCache::new(
            client.clone(),
            crawl_cfg.user_agent_profile.ua_string().to_string(),
            Arc::clone(&bucket),
        );

        let mut frontier = Frontier::new(&seed_domain, crawl_cfg);
        frontier.offer(seed.clone(), 0, 0);

        // Seed additional entry points from the site's sitemaps
        let sitemaps = robots.rules_for(&seed).await.sitemaps();
        if !sitemaps.is_empty() {
            for loc in discover_sitemap_urls(&client, &bucket, &sitemaps).await {
                if let Ok(url) = normalize_url(&loc) {
                    frontier.offer(url, 1, 0);
                }
            }
        }

        let start = Instant::now();
        let deadline = start + Duration::from_secs(crawl_cfg.max_runtime_seconds);
        let shared = Arc::new(Shared {
            crawl_id,
            seed_domain,
            respect_robots: crawl_cfg.respect_robots_txt,
            max_pages: crawl_cfg.max_pages,
            deadline,
            frontier: Mutex::new(frontier),
            bucket,
            fetcher: Fetcher::new(client, crawl_cfg, render),
            robots,
            batcher: PersistenceBatcher::new(Arc::clone(&self.storage), BATCH_SIZE),
            storage: Arc::clone(&self.storage),
            in_flight: AtomicUsize::new(0),
            fetched: AtomicU64::new(0),
            nav_bumps: Mutex::new(HashMap::new()),
            image_broken: tokio::sync::Mutex::new(HashMap::new()),
        });

        // Timer-driven flush so slow crawls still persist promptly
        let flush_task = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(FLUSH_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    shared.batcher.flush();
                }
            })
        };

        let mut workers = JoinSet::new();
        for worker_id in 0..crawl_cfg.concurrency {
            let shared = Arc::clone(&shared);
            let cancel = self.cancel_rx.clone();
            workers.spawn(worker_loop(shared, cancel, worker_id));
        }

        // Workers stop on their own; the grace period bounds how long an
        // abandoned in-flight fetch can hold up shutdown.
        let grace = Duration::from_secs(
            crawl_cfg.max_runtime_seconds
                + crawl_cfg.fetch_timeout_seconds
                + crawl_cfg.grace_period_seconds,
        );
        let drained = tokio::time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(crawl_id, "grace period expired, abandoning in-flight workers");
            workers.abort_all();
        }
        flush_task.abort();

        shared.batcher.flush();
        let total_pages = shared.batcher.inserted();

        // Post-crawl passes over the committed rows
        {
            let bumps = lock(&shared.nav_bumps);
            let mut guard = lock(&self.storage);
            for (url, score) in bumps.iter() {
                guard.bump_nav_score(crawl_id, url, *score)?;
            }
            let resolved = guard.resolve_link_statuses(crawl_id)?;
            debug!(crawl_id, resolved, "resolved link statuses");
            guard.touch_crawl(crawl_id, total_pages as i64)?;
        }
        let issues = run_issue_engine(&self.storage, crawl_id, seed.as_str())?;

        let status = if *self.cancel_rx.borrow() {
            CrawlStatus::Cancelled
        } else {
            CrawlStatus::Completed
        };
        lock(&self.storage).update_crawl_status(crawl_id, status, None)?;
        info!(
            crawl_id,
            status = status.to_db_string(),
            total_pages,
            issues,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "crawl finished"
        );

        Ok(CrawlOutcome {
            crawl_id,
            status,
            total_pages,
            issues,
        })
    }
}

async fn worker_loop<S: Storage>(
    shared: Arc<Shared<S>>,
    cancel: watch::Receiver<bool>,
    worker_id: usize,
) {
    debug!(worker_id, "worker started");
    loop {
        if *cancel.borrow() {
            debug!(worker_id, "worker stopping: cancelled");
            return;
        }
        if Instant::now() >= shared.deadline {
            debug!(worker_id, "worker stopping: deadline reached");
            return;
        }
        // Claiming in_flight under the frontier lock keeps the empty-and-
        // idle termination check race-free. The page budget counts claimed
        // work, not completed work, so concurrent workers cannot dispatch
        // past max_pages between a pop and the fetched increment.
        let entry = {
            let mut frontier = lock(&shared.frontier);
            let claimed = shared.fetched.load(Ordering::SeqCst)
                + shared.in_flight.load(Ordering::SeqCst) as u64;
            if claimed >= shared.max_pages {
                debug!(worker_id, "worker stopping: page budget reached");
                return;
            }
            match frontier.pop() {
                Some(entry) => {
                    shared.in_flight.fetch_add(1, Ordering::SeqCst);
                    Some(entry)
                }
                None => None,
            }
        };

        match entry {
            Some(entry) => {
                process_entry(&shared, entry).await;
                shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            None => {
                if shared.in_flight.load(Ordering::SeqCst) == 0 {
                    debug!(worker_id, "worker stopping: frontier drained");
                    return;
                }
                tokio::time::sleep(IDLE_POLL).await;
            }
        }
    }
}

async fn process_entry<S: Storage>(shared: &Shared<S>, entry: FrontierEntry) {
    let url = entry.url.clone();

    if shared.respect_robots && !shared.robots.is_allowed(&url).await {
        debug!(url = %url, "skipping: disallowed by robots.txt");
        shared.batcher.submit(PageUnit {
            page: blocked_page(shared.crawl_id, &entry, "disallowed by robots.txt"),
            links: vec![],
            images: vec![],
        });
        record_fetch(shared);
        return;
    }

    shared.bucket.acquire().await;
    let outcome = shared.fetcher.fetch(&url).await;
    debug!(
        url = %url,
        status = outcome.status_code,
        depth = entry.depth,
        elapsed_ms = outcome.elapsed_ms,
        "fetched"
    );

    let extract = outcome.body.as_deref().map(|body| parse_page(body, &outcome.final_url));

    let mut links = Vec::new();
    let mut images = Vec::new();
    if let Some(extract) = &extract {
        for link in &extract.links {
            let internal = is_internal(&link.url, &shared.seed_domain);
            if internal && link.nav_score > 0 {
                let mut bumps = lock(&shared.nav_bumps);
                let score = bumps.entry(link.url.as_str().to_string()).or_insert(0);
                *score = (*score).max(link.nav_score);
            }

            links.push(NewLink {
                target_url: link.url.as_str().to_string(),
                is_internal: internal,
                depth: entry.depth + 1,
                status_code: None,
                anchor_text: link.anchor_text.clone(),
                is_nofollow: link.is_nofollow,
                is_navigation: link.nav_score >= NAV_SCORE_THRESHOLD,
            });

            let mut frontier = lock(&shared.frontier);
            frontier.offer_discovered(
                link.url.clone(),
                entry.depth + 1,
                link.nav_score,
                link.anchor_text.clone(),
                Some(url.clone()),
            );
        }

        for image in &extract.images {
            let has_alt = image
                .alt
                .as_deref()
                .map(|alt| !alt.trim().is_empty())
                .unwrap_or(false);
            images.push(NewImage {
                src: image.src.clone(),
                alt: image.alt.clone(),
                width: image.width,
                height: image.height,
                has_alt,
                is_broken: is_image_broken(shared, &image.src).await,
            });
        }
    }

    let page = build_page(shared, &entry, &outcome, extract.as_ref());
    shared.batcher.submit(PageUnit {
        page,
        links,
        images,
    });
    record_fetch(shared);
}

/// Heartbeat: bump the fetched counter and the crawl's activity timestamp
fn record_fetch<S: Storage>(shared: &Shared<S>) {
    let fetched = shared.fetched.fetch_add(1, Ordering::SeqCst) + 1;
    if let Err(e) = lock(&shared.storage).touch_crawl(shared.crawl_id, fetched as i64) {
        warn!(error = %e, "failed to update crawl heartbeat");
    }
}

/// Checks whether an internal image URL resolves, one probe per URL
async fn is_image_broken<S: Storage>(shared: &Shared<S>, src: &str) -> bool {
    let url = match Url::parse(src) {
        Ok(u) => u,
        Err(_) => return false,
    };
    if !is_internal(&url, &shared.seed_domain) {
        return false;
    }

    {
        let cache = shared.image_broken.lock().await;
        if let Some(broken) = cache.get(src) {
            return *broken;
        }
    }

    shared.bucket.acquire().await;
    let broken = match shared.fetcher.probe_status(&url).await {
        Some(status) => status >= 400,
        None => true,
    };
    shared
        .image_broken
        .lock()
        .await
        .insert(src.to_string(), broken);
    broken
}

fn build_page<S: Storage>(
    shared: &Shared<S>,
    entry: &FrontierEntry,
    outcome: &FetchOutcome,
    extract: Option<&PageExtract>,
) -> NewPage {
    let nav_bump = lock(&shared.nav_bumps)
        .get(entry.url.as_str())
        .copied()
        .unwrap_or(0);
    let final_url = if outcome.final_url == entry.url {
        None
    } else {
        Some(outcome.final_url.as_str().to_string())
    };

    NewPage {
        crawl_id: shared.crawl_id,
        url: entry.url.as_str().to_string(),
        final_url,
        status_code: outcome.status_code,
        fetch_method: outcome.method,
        content_hash: extract.map(|e| e.content_hash.clone()),
        title: extract.and_then(|e| e.title.clone()),
        h1: extract.and_then(|e| e.h1.clone()),
        meta_description: extract.and_then(|e| e.meta_description.clone()),
        canonical: extract.and_then(|e| e.canonical.clone()),
        word_count: extract.map(|e| e.word_count).unwrap_or(0),
        text_excerpt: extract.and_then(|e| e.text_excerpt.clone()),
        depth: entry.depth,
        nav_score: entry.nav_score.max(nav_bump),
        is_primary: !entry.is_external && is_primary_path(&entry.url),
        has_viewport: extract.map(|e| e.has_viewport).unwrap_or(false),
        heading_levels: extract.map(|e| {
            e.heading_levels
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",")
        }),
        error: outcome.error.clone(),
    }
}

fn blocked_page(crawl_id: i64, entry: &FrontierEntry, reason: &str) -> NewPage {
    NewPage {
        crawl_id,
        url: entry.url.as_str().to_string(),
        final_url: None,
        status_code: 0,
        fetch_method: FetchMethod::Static,
        content_hash: None,
        title: None,
        h1: None,
        meta_description: None,
        canonical: None,
        word_count: 0,
        text_excerpt: None,
        depth: entry.depth,
        nav_score: entry.nav_score,
        is_primary: false,
        has_viewport: false,
        heading_levels: None,
        error: Some(reason.to_string()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
