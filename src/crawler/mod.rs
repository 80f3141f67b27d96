//! Crawl execution: frontier, fetching, parsing, and orchestration
//!
//! The orchestrator is the entry point; the submodules are its parts:
//! - `frontier`: BFS queue, visited-set, depth and external-domain limits
//! - `fetcher`: HTTP client, retries, JS-shell detection, render fallback
//! - `parser`: HTML extraction of metadata, links, and images
//! - `rate_limit`: the token bucket shared by the worker pool
//! - `orchestrator`: worker pool, state machine, termination, post-passes

pub mod fetcher;
pub mod frontier;
pub mod orchestrator;
pub mod parser;
pub mod rate_limit;

pub use fetcher::{build_http_client, FetchOutcome, Fetcher};
pub use frontier::{Admission, Frontier, FrontierEntry, Rejection};
pub use orchestrator::{CancelHandle, CrawlOutcome, Orchestrator};
pub use parser::{parse_page, PageExtract};
pub use rate_limit::TokenBucket;
