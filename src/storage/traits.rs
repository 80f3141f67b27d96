//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    CrawlRecord, CrawlStatus, ImageRecord, IssueRecord, LinkRecord, NewImage, NewIssue, NewLink,
    NewPage, PageRecord,
};
use chrono::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Crawl not found: {0}")]
    CrawlNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: CrawlStatus, to: CrawlStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A page together with its dependent rows, inserted as one transaction
///
/// The page is inserted first so links and images can reference its row ID.
/// If any statement fails the whole unit rolls back.
#[derive(Debug, Clone)]
pub struct PageUnit {
    pub page: NewPage,
    pub links: Vec<NewLink>,
    pub images: Vec<NewImage>,
}

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
/// Implementations should provide thread-safe access to the underlying storage.
pub trait Storage {
    // ===== Crawl Management =====

    /// Creates a new crawl in the pending state
    ///
    /// # Arguments
    ///
    /// * `seed_url` - The normalized seed URL
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created crawl
    fn create_crawl(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a crawl by ID
    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord>;

    /// Updates the status of a crawl
    ///
    /// Terminal statuses are final: the update only applies if the crawl is
    /// currently in a non-terminal state. Returns true if a row changed.
    fn update_crawl_status(
        &mut self,
        crawl_id: i64,
        status: CrawlStatus,
        error: Option<&str>,
    ) -> StorageResult<bool>;

    /// Records crawl progress: bumps last_activity_at and the page count
    fn touch_crawl(&mut self, crawl_id: i64, total_pages: i64) -> StorageResult<()>;

    /// Finds active crawls that have exceeded their allowed age
    ///
    /// Running crawls are stale when their last activity is older than
    /// `running_timeout`. Pending crawls are stale when their creation time
    /// is older than `queued_timeout`.
    fn get_stale_crawls(
        &self,
        running_timeout: Duration,
        queued_timeout: Duration,
    ) -> StorageResult<Vec<CrawlRecord>>;

    // ===== Page Management =====

    /// Inserts a page with its links and images in one transaction
    ///
    /// # Returns
    ///
    /// The ID of the inserted page row
    fn insert_page_unit(&mut self, unit: &PageUnit) -> StorageResult<i64>;

    /// Gets all pages for a crawl
    fn pages_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Gets all links for a crawl
    fn links_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<LinkRecord>>;

    /// Gets all images for a crawl
    fn images_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<ImageRecord>>;

    /// Raises a page's navigation score to at least `score`
    ///
    /// Used when a link into an already-stored page carries a higher
    /// navigation score than the one recorded at insert time.
    fn bump_nav_score(&mut self, crawl_id: i64, url: &str, score: i64) -> StorageResult<()>;

    // ===== Link Management =====

    /// Fills in link status codes from pages fetched in the same crawl
    ///
    /// Links whose target URL matches a crawled page inherit that page's
    /// status code. Returns the number of links updated.
    fn resolve_link_statuses(&mut self, crawl_id: i64) -> StorageResult<usize>;

    // ===== Issue Management =====

    /// Deletes existing issues for a crawl and inserts the given set
    fn replace_issues(&mut self, crawl_id: i64, issues: &[NewIssue]) -> StorageResult<usize>;

    /// Gets all issues for a crawl
    fn issues_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<IssueRecord>>;
}
