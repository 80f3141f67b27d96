//! Rule-based issue detection over committed crawl data
//!
//! The engine runs after a crawl's pages are durable: it reads page, link,
//! and image rows back from storage, evaluates every registered rule, and
//! replaces the crawl's issue set. Because it only sees committed rows,
//! every issue it emits references a page that already exists.

mod rules;

pub use rules::{Rule, RuleContext, RULES, THIN_CONTENT_THRESHOLD};

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::storage::{NewIssue, Storage};
use crate::Result;

/// Evaluates every registered rule against the context
pub fn evaluate(ctx: &RuleContext) -> Vec<NewIssue> {
    RULES.iter().flat_map(|rule| rule(ctx)).collect()
}

/// Runs the full issue pass for a crawl and stores the results
///
/// Replaces any issues from a previous pass, so re-running the engine on
/// the same crawl is idempotent.
pub fn run_issue_engine<S: Storage>(
    storage: &Arc<Mutex<S>>,
    crawl_id: i64,
    seed_url: &str,
) -> Result<usize> {
    let (pages, links, images) = {
        let guard = lock(storage);
        (
            guard.pages_for_crawl(crawl_id)?,
            guard.links_for_crawl(crawl_id)?,
            guard.images_for_crawl(crawl_id)?,
        )
    };

    let ctx = RuleContext {
        pages: &pages,
        links: &links,
        images: &images,
        seed_url,
    };
    let issues = evaluate(&ctx);

    let stored = lock(storage).replace_issues(crawl_id, &issues)?;
    info!(crawl_id, issues = stored, "issue pass complete");
    Ok(stored)
}

fn lock<S>(storage: &Arc<Mutex<S>>) -> std::sync::MutexGuard<'_, S> {
    match storage.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
