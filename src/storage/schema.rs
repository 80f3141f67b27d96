//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the sitecheck database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawls
CREATE TABLE IF NOT EXISTS crawls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    last_activity_at TEXT,
    total_pages INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_crawls_status ON crawls(status);

-- Crawled pages, one row per fetched URL
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    url TEXT NOT NULL,
    final_url TEXT,
    status_code INTEGER NOT NULL,
    fetch_method TEXT NOT NULL,
    content_hash TEXT,
    title TEXT,
    h1 TEXT,
    meta_description TEXT,
    canonical TEXT,
    word_count INTEGER NOT NULL DEFAULT 0,
    text_excerpt TEXT,
    depth INTEGER NOT NULL DEFAULT 0,
    nav_score INTEGER NOT NULL DEFAULT 0,
    is_primary INTEGER NOT NULL DEFAULT 0,
    has_viewport INTEGER NOT NULL DEFAULT 0,
    heading_levels TEXT,
    error TEXT,
    fetched_at TEXT NOT NULL,
    UNIQUE(crawl_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_crawl ON pages(crawl_id);
CREATE INDEX IF NOT EXISTS idx_pages_url ON pages(crawl_id, url);

-- Outgoing links discovered on pages
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_page_id INTEGER NOT NULL REFERENCES pages(id),
    target_url TEXT NOT NULL,
    is_internal INTEGER NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    status_code INTEGER,
    anchor_text TEXT,
    is_nofollow INTEGER NOT NULL DEFAULT 0,
    is_navigation INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_page_id);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(target_url);

-- Images discovered on pages
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    src TEXT NOT NULL,
    alt TEXT,
    width INTEGER,
    height INTEGER,
    has_alt INTEGER NOT NULL DEFAULT 0,
    is_broken INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_images_page ON images(page_id);

-- Issues detected after a crawl completes
CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    page_id INTEGER REFERENCES pages(id),
    issue_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    pointer TEXT
);

CREATE INDEX IF NOT EXISTS idx_issues_crawl ON issues(crawl_id);
CREATE INDEX IF NOT EXISTS idx_issues_severity ON issues(crawl_id, severity);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - Database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
