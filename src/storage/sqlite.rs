//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageUnit, Storage, StorageError, StorageResult};
use crate::storage::{
    CrawlRecord, CrawlStatus, FetchMethod, ImageRecord, IssueRecord, LinkRecord, NewIssue,
    PageRecord, Severity,
};
use crate::SitecheckError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SitecheckError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SitecheckError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, SitecheckError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Direct connection access for test fixtures
    #[cfg(test)]
    pub fn raw_connection_for_tests(&self) -> &Connection {
        &self.conn
    }
}

fn map_crawl_row(row: &Row) -> rusqlite::Result<CrawlRecord> {
    Ok(CrawlRecord {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        config_hash: row.get(2)?,
        status: CrawlStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(CrawlStatus::Failed),
        error: row.get(4)?,
        created_at: row.get(5)?,
        started_at: row.get(6)?,
        completed_at: row.get(7)?,
        last_activity_at: row.get(8)?,
        total_pages: row.get(9)?,
    })
}

const CRAWL_COLUMNS: &str = "id, seed_url, config_hash, status, error, created_at, started_at, \
                             completed_at, last_activity_at, total_pages";

fn map_page_row(row: &Row) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        crawl_id: row.get(1)?,
        url: row.get(2)?,
        final_url: row.get(3)?,
        status_code: row.get(4)?,
        fetch_method: FetchMethod::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(FetchMethod::Static),
        content_hash: row.get(6)?,
        title: row.get(7)?,
        h1: row.get(8)?,
        meta_description: row.get(9)?,
        canonical: row.get(10)?,
        word_count: row.get(11)?,
        text_excerpt: row.get(12)?,
        depth: row.get(13)?,
        nav_score: row.get(14)?,
        is_primary: row.get(15)?,
        has_viewport: row.get(16)?,
        heading_levels: row.get(17)?,
        error: row.get(18)?,
        fetched_at: row.get(19)?,
    })
}

const PAGE_COLUMNS: &str = "id, crawl_id, url, final_url, status_code, fetch_method, \
                            content_hash, title, h1, meta_description, canonical, word_count, \
                            text_excerpt, depth, nav_score, is_primary, has_viewport, \
                            heading_levels, error, fetched_at";

/// Parses a stored RFC 3339 timestamp, returning None on malformed data
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Storage for SqliteStorage {
    // ===== Crawl Management =====

    fn create_crawl(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawls (seed_url, config_hash, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                seed_url,
                config_hash,
                CrawlStatus::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord> {
        let sql = format!("SELECT {CRAWL_COLUMNS} FROM crawls WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;

        stmt.query_row(params![crawl_id], map_crawl_row)
            .map_err(|_| StorageError::CrawlNotFound(crawl_id))
    }

    fn update_crawl_status(
        &mut self,
        crawl_id: i64,
        status: CrawlStatus,
        error: Option<&str>,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();

        // Terminal statuses win exactly once: the WHERE clause skips rows
        // already in a terminal state, so a completed crawl cannot be
        // re-marked cancelled by the monitor or vice versa.
        let changed = if status.is_terminal() {
            self.conn.execute(
                "UPDATE crawls SET status = ?1, error = ?2, completed_at = ?3
                 WHERE id = ?4 AND status IN ('pending', 'running')",
                params![status.to_db_string(), error, now, crawl_id],
            )?
        } else {
            self.conn.execute(
                "UPDATE crawls SET status = ?1,
                        started_at = COALESCE(started_at, ?2),
                        last_activity_at = ?2
                 WHERE id = ?3 AND status IN ('pending', 'running')",
                params![status.to_db_string(), now, crawl_id],
            )?
        };

        Ok(changed > 0)
    }

    fn touch_crawl(&mut self, crawl_id: i64, total_pages: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE crawls SET last_activity_at = ?1, total_pages = ?2 WHERE id = ?3",
            params![now, total_pages, crawl_id],
        )?;
        Ok(())
    }

    fn get_stale_crawls(
        &self,
        running_timeout: Duration,
        queued_timeout: Duration,
    ) -> StorageResult<Vec<CrawlRecord>> {
        let sql =
            format!("SELECT {CRAWL_COLUMNS} FROM crawls WHERE status IN ('pending', 'running')");
        let mut stmt = self.conn.prepare(&sql)?;
        let active = stmt
            .query_map([], map_crawl_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let now = Utc::now();
        let stale = active
            .into_iter()
            .filter(|crawl| {
                let (reference, timeout) = match crawl.status {
                    CrawlStatus::Running => {
                        // Fall back to start time for crawls that died
                        // before their first heartbeat
                        let ts = crawl
                            .last_activity_at
                            .as_deref()
                            .or(crawl.started_at.as_deref())
                            .unwrap_or(&crawl.created_at);
                        (ts, running_timeout)
                    }
                    _ => (crawl.created_at.as_str(), queued_timeout),
                };
                match parse_timestamp(reference) {
                    Some(ts) => now - ts > timeout,
                    None => true,
                }
            })
            .collect();

        Ok(stale)
    }

    // ===== Page Management =====

    fn insert_page_unit(&mut self, unit: &PageUnit) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO pages (crawl_id, url, final_url, status_code, fetch_method,
                                content_hash, title, h1, meta_description, canonical,
                                word_count, text_excerpt, depth, nav_score, is_primary,
                                has_viewport, heading_levels, error, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                unit.page.crawl_id,
                unit.page.url,
                unit.page.final_url,
                unit.page.status_code,
                unit.page.fetch_method.to_db_string(),
                unit.page.content_hash,
                unit.page.title,
                unit.page.h1,
                unit.page.meta_description,
                unit.page.canonical,
                unit.page.word_count,
                unit.page.text_excerpt,
                unit.page.depth,
                unit.page.nav_score,
                unit.page.is_primary,
                unit.page.has_viewport,
                unit.page.heading_levels,
                unit.page.error,
                now,
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut link_stmt = tx.prepare(
                "INSERT INTO links (source_page_id, target_url, is_internal, depth,
                                    status_code, anchor_text, is_nofollow, is_navigation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for link in &unit.links {
                link_stmt.execute(params![
                    page_id,
                    link.target_url,
                    link.is_internal,
                    link.depth,
                    link.status_code,
                    link.anchor_text,
                    link.is_nofollow,
                    link.is_navigation,
                ])?;
            }

            let mut image_stmt = tx.prepare(
                "INSERT INTO images (page_id, src, alt, width, height, has_alt, is_broken)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for image in &unit.images {
                image_stmt.execute(params![
                    page_id,
                    image.src,
                    image.alt,
                    image.width,
                    image.height,
                    image.has_alt,
                    image.is_broken,
                ])?;
            }
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn pages_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<PageRecord>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE crawl_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![crawl_id], map_page_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn links_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.source_page_id, l.target_url, l.is_internal, l.depth,
                    l.status_code, l.anchor_text, l.is_nofollow, l.is_navigation
             FROM links l
             JOIN pages p ON p.id = l.source_page_id
             WHERE p.crawl_id = ?1
             ORDER BY l.id",
        )?;
        let links = stmt
            .query_map(params![crawl_id], |row| {
                Ok(LinkRecord {
                    id: row.get(0)?,
                    source_page_id: row.get(1)?,
                    target_url: row.get(2)?,
                    is_internal: row.get(3)?,
                    depth: row.get(4)?,
                    status_code: row.get(5)?,
                    anchor_text: row.get(6)?,
                    is_nofollow: row.get(7)?,
                    is_navigation: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    fn images_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.page_id, i.src, i.alt, i.width, i.height, i.has_alt, i.is_broken
             FROM images i
             JOIN pages p ON p.id = i.page_id
             WHERE p.crawl_id = ?1
             ORDER BY i.id",
        )?;
        let images = stmt
            .query_map(params![crawl_id], |row| {
                Ok(ImageRecord {
                    id: row.get(0)?,
                    page_id: row.get(1)?,
                    src: row.get(2)?,
                    alt: row.get(3)?,
                    width: row.get(4)?,
                    height: row.get(5)?,
                    has_alt: row.get(6)?,
                    is_broken: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    fn bump_nav_score(&mut self, crawl_id: i64, url: &str, score: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE pages SET nav_score = MAX(nav_score, ?1)
             WHERE crawl_id = ?2 AND url = ?3",
            params![score, crawl_id, url],
        )?;
        Ok(())
    }

    // ===== Link Management =====

    fn resolve_link_statuses(&mut self, crawl_id: i64) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE links SET status_code = (
                 SELECT p.status_code FROM pages p
                 WHERE p.crawl_id = ?1
                   AND (p.url = links.target_url OR p.final_url = links.target_url)
                 LIMIT 1
             )
             WHERE links.status_code IS NULL
               AND links.source_page_id IN (SELECT id FROM pages WHERE crawl_id = ?1)
               AND EXISTS (
                 SELECT 1 FROM pages p
                 WHERE p.crawl_id = ?1
                   AND (p.url = links.target_url OR p.final_url = links.target_url)
               )",
            params![crawl_id],
        )?;
        Ok(changed)
    }

    // ===== Issue Management =====

    fn replace_issues(&mut self, crawl_id: i64, issues: &[NewIssue]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM issues WHERE crawl_id = ?1", params![crawl_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO issues (crawl_id, page_id, issue_type, severity, message, pointer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for issue in issues {
                stmt.execute(params![
                    crawl_id,
                    issue.page_id,
                    issue.issue_type,
                    issue.severity.to_db_string(),
                    issue.message,
                    issue.pointer,
                ])?;
            }
        }
        tx.commit()?;
        Ok(issues.len())
    }

    fn issues_for_crawl(&self, crawl_id: i64) -> StorageResult<Vec<IssueRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, crawl_id, page_id, issue_type, severity, message, pointer
             FROM issues WHERE crawl_id = ?1 ORDER BY id",
        )?;
        let issues = stmt
            .query_map(params![crawl_id], |row| {
                Ok(IssueRecord {
                    id: row.get(0)?,
                    crawl_id: row.get(1)?,
                    page_id: row.get(2)?,
                    issue_type: row.get(3)?,
                    severity: Severity::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(Severity::Low),
                    message: row.get(5)?,
                    pointer: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewImage, NewLink, NewPage};

    fn test_page(crawl_id: i64, url: &str) -> NewPage {
        NewPage {
            crawl_id,
            url: url.to_string(),
            final_url: None,
            status_code: 200,
            fetch_method: FetchMethod::Static,
            content_hash: Some("deadbeef".to_string()),
            title: Some("Test".to_string()),
            h1: None,
            meta_description: None,
            canonical: None,
            word_count: 100,
            text_excerpt: None,
            depth: 0,
            nav_score: 0,
            is_primary: false,
            has_viewport: true,
            heading_levels: None,
            error: None,
        }
    }

    fn unit_with(page: NewPage, links: Vec<NewLink>, images: Vec<NewImage>) -> PageUnit {
        PageUnit {
            page,
            links,
            images,
        }
    }

    #[test]
    fn test_create_and_get_crawl() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "abc123").unwrap();

        let crawl = storage.get_crawl(id).unwrap();
        assert_eq!(crawl.seed_url, "https://example.com/");
        assert_eq!(crawl.config_hash, "abc123");
        assert_eq!(crawl.status, CrawlStatus::Pending);
        assert!(crawl.started_at.is_none());
    }

    #[test]
    fn test_get_missing_crawl() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_crawl(42),
            Err(StorageError::CrawlNotFound(42))
        ));
    }

    #[test]
    fn test_status_transition_to_running_sets_started_at() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "h").unwrap();

        assert!(storage
            .update_crawl_status(id, CrawlStatus::Running, None)
            .unwrap());
        let crawl = storage.get_crawl(id).unwrap();
        assert_eq!(crawl.status, CrawlStatus::Running);
        assert!(crawl.started_at.is_some());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "h").unwrap();

        assert!(storage
            .update_crawl_status(id, CrawlStatus::Completed, None)
            .unwrap());
        // A later cancel attempt must not overwrite the completed status
        assert!(!storage
            .update_crawl_status(id, CrawlStatus::Cancelled, Some("stale"))
            .unwrap());

        let crawl = storage.get_crawl(id).unwrap();
        assert_eq!(crawl.status, CrawlStatus::Completed);
        assert!(crawl.error.is_none());
    }

    #[test]
    fn test_failed_status_records_error() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "h").unwrap();

        storage
            .update_crawl_status(id, CrawlStatus::Failed, Some("seed unreachable"))
            .unwrap();
        let crawl = storage.get_crawl(id).unwrap();
        assert_eq!(crawl.status, CrawlStatus::Failed);
        assert_eq!(crawl.error.as_deref(), Some("seed unreachable"));
        assert!(crawl.completed_at.is_some());
    }

    #[test]
    fn test_insert_page_unit_with_dependents() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl("https://example.com/", "h").unwrap();

        let unit = unit_with(
            test_page(crawl_id, "https://example.com/"),
            vec![NewLink {
                target_url: "https://example.com/about".to_string(),
                is_internal: true,
                depth: 1,
                status_code: None,
                anchor_text: Some("About".to_string()),
                is_nofollow: false,
                is_navigation: true,
            }],
            vec![NewImage {
                src: "https://example.com/logo.png".to_string(),
                alt: Some("Logo".to_string()),
                width: Some(64),
                height: Some(64),
                has_alt: true,
                is_broken: false,
            }],
        );
        let page_id = storage.insert_page_unit(&unit).unwrap();

        let pages = storage.pages_for_crawl(crawl_id).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, page_id);

        let links = storage.links_for_crawl(crawl_id).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source_page_id, page_id);
        assert!(links[0].is_navigation);

        let images = storage.images_for_crawl(crawl_id).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].alt.as_deref(), Some("Logo"));
    }

    #[test]
    fn test_duplicate_page_url_rejected() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl("https://example.com/", "h").unwrap();

        let unit = unit_with(test_page(crawl_id, "https://example.com/"), vec![], vec![]);
        storage.insert_page_unit(&unit).unwrap();
        assert!(storage.insert_page_unit(&unit).is_err());
    }

    #[test]
    fn test_resolve_link_statuses() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl("https://example.com/", "h").unwrap();

        let seed = unit_with(
            test_page(crawl_id, "https://example.com/"),
            vec![
                NewLink {
                    target_url: "https://example.com/about".to_string(),
                    is_internal: true,
                    depth: 1,
                    status_code: None,
                    anchor_text: None,
                    is_nofollow: false,
                    is_navigation: false,
                },
                NewLink {
                    target_url: "https://other.example/".to_string(),
                    is_internal: false,
                    depth: 1,
                    status_code: None,
                    anchor_text: None,
                    is_nofollow: false,
                    is_navigation: false,
                },
            ],
            vec![],
        );
        storage.insert_page_unit(&seed).unwrap();

        let mut about = test_page(crawl_id, "https://example.com/about");
        about.status_code = 404;
        storage
            .insert_page_unit(&unit_with(about, vec![], vec![]))
            .unwrap();

        let updated = storage.resolve_link_statuses(crawl_id).unwrap();
        assert_eq!(updated, 1);

        let links = storage.links_for_crawl(crawl_id).unwrap();
        let about_link = links
            .iter()
            .find(|l| l.target_url == "https://example.com/about")
            .unwrap();
        assert_eq!(about_link.status_code, Some(404));
        let external = links
            .iter()
            .find(|l| l.target_url == "https://other.example/")
            .unwrap();
        assert_eq!(external.status_code, None);
    }

    #[test]
    fn test_bump_nav_score_takes_max() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl("https://example.com/", "h").unwrap();

        let mut page = test_page(crawl_id, "https://example.com/about");
        page.nav_score = 5;
        storage
            .insert_page_unit(&unit_with(page, vec![], vec![]))
            .unwrap();

        storage
            .bump_nav_score(crawl_id, "https://example.com/about", 9)
            .unwrap();
        storage
            .bump_nav_score(crawl_id, "https://example.com/about", 3)
            .unwrap();

        let pages = storage.pages_for_crawl(crawl_id).unwrap();
        assert_eq!(pages[0].nav_score, 9);
    }

    #[test]
    fn test_stale_crawls_pending_and_running() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let pending_id = storage.create_crawl("https://a.example/", "h").unwrap();
        let running_id = storage.create_crawl("https://b.example/", "h").unwrap();
        let fresh_id = storage.create_crawl("https://c.example/", "h").unwrap();
        storage
            .update_crawl_status(running_id, CrawlStatus::Running, None)
            .unwrap();
        storage
            .update_crawl_status(fresh_id, CrawlStatus::Running, None)
            .unwrap();

        // Backdate the first two crawls past their timeouts
        let old = (Utc::now() - Duration::hours(2)).to_rfc3339();
        storage
            .conn
            .execute(
                "UPDATE crawls SET created_at = ?1 WHERE id = ?2",
                params![old, pending_id],
            )
            .unwrap();
        storage
            .conn
            .execute(
                "UPDATE crawls SET last_activity_at = ?1 WHERE id = ?2",
                params![old, running_id],
            )
            .unwrap();

        let stale = storage
            .get_stale_crawls(Duration::minutes(30), Duration::minutes(60))
            .unwrap();
        let ids: Vec<i64> = stale.iter().map(|c| c.id).collect();
        assert!(ids.contains(&pending_id));
        assert!(ids.contains(&running_id));
        assert!(!ids.contains(&fresh_id));
    }

    #[test]
    fn test_completed_crawls_never_stale() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "h").unwrap();
        storage
            .update_crawl_status(id, CrawlStatus::Completed, None)
            .unwrap();

        let old = (Utc::now() - Duration::days(7)).to_rfc3339();
        storage
            .conn
            .execute(
                "UPDATE crawls SET created_at = ?1, last_activity_at = ?1 WHERE id = ?2",
                params![old, id],
            )
            .unwrap();

        let stale = storage
            .get_stale_crawls(Duration::minutes(30), Duration::minutes(60))
            .unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn test_replace_issues_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl("https://example.com/", "h").unwrap();

        let issues = vec![NewIssue {
            page_id: None,
            issue_type: "missing_title".to_string(),
            severity: Severity::High,
            message: "Page has no title".to_string(),
            pointer: None,
        }];
        storage.replace_issues(crawl_id, &issues).unwrap();
        storage.replace_issues(crawl_id, &issues).unwrap();

        let stored = storage.issues_for_crawl(crawl_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].severity, Severity::High);
    }

    #[test]
    fn test_touch_crawl_updates_activity() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage.create_crawl("https://example.com/", "h").unwrap();

        storage.touch_crawl(id, 17).unwrap();
        let crawl = storage.get_crawl(id).unwrap();
        assert_eq!(crawl.total_pages, 17);
        assert!(crawl.last_activity_at.is_some());
    }
}
