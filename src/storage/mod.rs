//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Crawl lifecycle tracking and heartbeats
//! - Page, link, and image persistence
//! - Detected issue storage
//! - Stale crawl queries for the monitor

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{PageUnit, Storage, StorageError, StorageResult};

use crate::SitecheckError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SitecheckError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SitecheckError> {
    SqliteStorage::new(path)
}

/// Status of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// Created but not yet picked up by the orchestrator
    Pending,
    /// Actively crawling
    Running,
    /// Finished successfully (page limit, frontier exhaustion, or deadline)
    Completed,
    /// Finished unsuccessfully
    Failed,
    /// Cancelled by request or reaped by the stale monitor
    Cancelled,
}

impl CrawlStatus {
    /// Converts the status to its database representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            CrawlStatus::Pending => "pending",
            CrawlStatus::Running => "running",
            CrawlStatus::Completed => "completed",
            CrawlStatus::Failed => "failed",
            CrawlStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its database representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CrawlStatus::Pending),
            "running" => Some(CrawlStatus::Running),
            "completed" => Some(CrawlStatus::Completed),
            "failed" => Some(CrawlStatus::Failed),
            "cancelled" => Some(CrawlStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the status is terminal and must never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrawlStatus::Completed | CrawlStatus::Failed | CrawlStatus::Cancelled
        )
    }
}

/// How a page body was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// Plain HTTP GET
    Static,
    /// Body came from the JavaScript rendering service
    Rendered,
}

impl FetchMethod {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            FetchMethod::Static => "static",
            FetchMethod::Rendered => "rendered",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "static" => Some(FetchMethod::Static),
            "rendered" => Some(FetchMethod::Rendered),
            _ => None,
        }
    }
}

/// Severity of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// Represents a crawl row
#[derive(Debug, Clone)]
pub struct CrawlRecord {
    pub id: i64,
    pub seed_url: String,
    pub config_hash: String,
    pub status: CrawlStatus,
    pub error: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub last_activity_at: Option<String>,
    pub total_pages: i64,
}

/// Represents a crawled page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub crawl_id: i64,
    pub url: String,
    pub final_url: Option<String>,
    pub status_code: u16,
    pub fetch_method: FetchMethod,
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub word_count: i64,
    pub text_excerpt: Option<String>,
    pub depth: u32,
    pub nav_score: i64,
    pub is_primary: bool,
    pub has_viewport: bool,
    pub heading_levels: Option<String>,
    pub error: Option<String>,
    pub fetched_at: String,
}

/// Represents an outgoing link discovered on a page
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub id: i64,
    pub source_page_id: i64,
    pub target_url: String,
    pub is_internal: bool,
    pub depth: u32,
    pub status_code: Option<u16>,
    pub anchor_text: Option<String>,
    pub is_nofollow: bool,
    pub is_navigation: bool,
}

/// Represents an image discovered on a page
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: i64,
    pub page_id: i64,
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub has_alt: bool,
    pub is_broken: bool,
}

/// Represents a detected issue
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub id: i64,
    pub crawl_id: i64,
    pub page_id: Option<i64>,
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
    /// What in the page triggered the issue, e.g. a URL or tag
    pub pointer: Option<String>,
}

/// A page ready for insertion
#[derive(Debug, Clone)]
pub struct NewPage {
    pub crawl_id: i64,
    pub url: String,
    pub final_url: Option<String>,
    pub status_code: u16,
    pub fetch_method: FetchMethod,
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub word_count: i64,
    pub text_excerpt: Option<String>,
    pub depth: u32,
    pub nav_score: i64,
    pub is_primary: bool,
    pub has_viewport: bool,
    pub heading_levels: Option<String>,
    pub error: Option<String>,
}

/// A link ready for insertion, keyed to its page within a batch unit
#[derive(Debug, Clone)]
pub struct NewLink {
    pub target_url: String,
    pub is_internal: bool,
    pub depth: u32,
    pub status_code: Option<u16>,
    pub anchor_text: Option<String>,
    pub is_nofollow: bool,
    pub is_navigation: bool,
}

/// An image ready for insertion, keyed to its page within a batch unit
#[derive(Debug, Clone)]
pub struct NewImage {
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub has_alt: bool,
    pub is_broken: bool,
}

/// An issue ready for insertion
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub page_id: Option<i64>,
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
    pub pointer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_status_round_trip() {
        for status in [
            CrawlStatus::Pending,
            CrawlStatus::Running,
            CrawlStatus::Completed,
            CrawlStatus::Failed,
            CrawlStatus::Cancelled,
        ] {
            assert_eq!(
                CrawlStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_crawl_status_terminal() {
        assert!(!CrawlStatus::Pending.is_terminal());
        assert!(!CrawlStatus::Running.is_terminal());
        assert!(CrawlStatus::Completed.is_terminal());
        assert!(CrawlStatus::Failed.is_terminal());
        assert!(CrawlStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_unknown_status_string() {
        assert_eq!(CrawlStatus::from_db_string("paused"), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
