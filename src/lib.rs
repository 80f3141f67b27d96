//! Sitecheck: a single-site crawl and audit engine
//!
//! This crate crawls a target website breadth-first from a seed URL, extracts
//! pages, links, images and metadata, persists them in batches, and evaluates
//! the crawled data against a rule set to surface technical/SEO issues.

pub mod batcher;
pub mod config;
pub mod crawler;
pub mod issues;
pub mod monitor;
pub mod render;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for sitecheck operations
#[derive(Debug, Error)]
pub enum SitecheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Render service error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Invalid crawl status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: storage::CrawlStatus,
        to: storage::CrawlStatus,
    },

    #[error("Crawl {0} not found")]
    CrawlNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for sitecheck operations
pub type Result<T> = std::result::Result<T, SitecheckError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use storage::CrawlStatus;
pub use url::{is_blacklisted, is_internal, normalize_url, registrable_domain};
