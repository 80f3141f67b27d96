//! Issue detection rules
//!
//! Each rule is a pure function over committed crawl data. Rules are
//! independent and side-effect-free; the engine runs every registered rule
//! and concatenates their output. Severity is fixed per rule.

use std::collections::HashMap;

use crate::storage::{ImageRecord, LinkRecord, NewIssue, PageRecord, Severity};

/// Word count below which a page is considered thin
pub const THIN_CONTENT_THRESHOLD: i64 = 300;

/// Title length bounds in characters
const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 60;

/// Committed crawl data a rule evaluates against
pub struct RuleContext<'a> {
    pub pages: &'a [PageRecord],
    pub links: &'a [LinkRecord],
    pub images: &'a [ImageRecord],
    pub seed_url: &'a str,
}

/// A single detection rule
pub type Rule = fn(&RuleContext) -> Vec<NewIssue>;

/// All registered rules
pub const RULES: &[Rule] = &[
    broken_internal_links,
    broken_images,
    missing_alt,
    thin_content,
    title_rules,
    description_rules,
    missing_h1,
    heading_hierarchy,
    missing_viewport,
    orphan_pages,
    missing_canonical,
];

fn issue(
    page_id: Option<i64>,
    issue_type: &str,
    severity: Severity,
    message: String,
    pointer: Option<String>,
) -> NewIssue {
    NewIssue {
        page_id,
        issue_type: issue_type.to_string(),
        severity,
        message,
        pointer,
    }
}

/// Whether a page fetched successfully and counts for graph rules
fn audited(page: &PageRecord) -> bool {
    page.error.is_none() && (200..300).contains(&page.status_code)
}

/// Whether a page has a parsed HTML body the content rules can judge
///
/// A 200 response with a non-HTML content type (a linked feed or JSON
/// endpoint) produces a page row with no body-derived fields; flagging it
/// for a missing title or viewport would be noise.
fn content_audited(page: &PageRecord) -> bool {
    audited(page) && page.content_hash.is_some()
}

fn broken_internal_links(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.links
        .iter()
        .filter(|link| {
            link.is_internal
                && link
                    .status_code
                    .map(|s| (400..600).contains(&s))
                    .unwrap_or(false)
        })
        .map(|link| {
            issue(
                Some(link.source_page_id),
                "broken_internal_link",
                Severity::Critical,
                format!(
                    "Internal link returns {}",
                    link.status_code.unwrap_or_default()
                ),
                Some(link.target_url.clone()),
            )
        })
        .collect()
}

fn broken_images(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.images
        .iter()
        .filter(|image| image.is_broken)
        .map(|image| {
            issue(
                Some(image.page_id),
                "broken_image",
                Severity::High,
                "Image fails to load".to_string(),
                Some(image.src.clone()),
            )
        })
        .collect()
}

fn missing_alt(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.images
        .iter()
        .filter(|image| !image.has_alt)
        .map(|image| {
            issue(
                Some(image.page_id),
                "missing_alt",
                Severity::High,
                "Image has no alt text".to_string(),
                Some(image.src.clone()),
            )
        })
        .collect()
}

fn thin_content(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.pages
        .iter()
        .filter(|page| content_audited(page) && page.word_count < THIN_CONTENT_THRESHOLD)
        .map(|page| {
            issue(
                Some(page.id),
                "thin_content",
                Severity::Medium,
                format!(
                    "Page has only {} words (threshold {})",
                    page.word_count, THIN_CONTENT_THRESHOLD
                ),
                None,
            )
        })
        .collect()
}

fn title_rules(ctx: &RuleContext) -> Vec<NewIssue> {
    let mut issues = Vec::new();
    let mut seen: HashMap<&str, Vec<i64>> = HashMap::new();

    for page in ctx.pages.iter().filter(|p| content_audited(p)) {
        match page.title.as_deref() {
            None | Some("") => issues.push(issue(
                Some(page.id),
                "missing_title",
                Severity::High,
                "Page has no title tag".to_string(),
                None,
            )),
            Some(title) => {
                let chars = title.chars().count();
                if chars < TITLE_MIN_CHARS {
                    issues.push(issue(
                        Some(page.id),
                        "title_too_short",
                        Severity::Low,
                        format!("Title is only {chars} characters"),
                        Some(title.to_string()),
                    ));
                } else if chars > TITLE_MAX_CHARS {
                    issues.push(issue(
                        Some(page.id),
                        "title_too_long",
                        Severity::Low,
                        format!("Title is {chars} characters"),
                        Some(title.to_string()),
                    ));
                }
                seen.entry(title).or_default().push(page.id);
            }
        }
    }

    for (title, page_ids) in seen {
        if page_ids.len() > 1 {
            for page_id in page_ids {
                issues.push(issue(
                    Some(page_id),
                    "duplicate_title",
                    Severity::High,
                    "Title is shared with another page".to_string(),
                    Some(title.to_string()),
                ));
            }
        }
    }
    issues
}

fn description_rules(ctx: &RuleContext) -> Vec<NewIssue> {
    let mut issues = Vec::new();
    let mut seen: HashMap<&str, Vec<i64>> = HashMap::new();

    for page in ctx.pages.iter().filter(|p| content_audited(p)) {
        match page.meta_description.as_deref() {
            None | Some("") => issues.push(issue(
                Some(page.id),
                "missing_description",
                Severity::Medium,
                "Page has no meta description".to_string(),
                None,
            )),
            Some(description) => seen.entry(description).or_default().push(page.id),
        }
    }

    for (_, page_ids) in seen {
        if page_ids.len() > 1 {
            for page_id in page_ids {
                issues.push(issue(
                    Some(page_id),
                    "duplicate_description",
                    Severity::Medium,
                    "Meta description is shared with another page".to_string(),
                    None,
                ));
            }
        }
    }
    issues
}

fn missing_h1(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.pages
        .iter()
        .filter(|page| content_audited(page) && page.h1.as_deref().unwrap_or("").is_empty())
        .map(|page| {
            issue(
                Some(page.id),
                "missing_h1",
                Severity::Medium,
                "Page has no h1 heading".to_string(),
                None,
            )
        })
        .collect()
}

fn heading_hierarchy(ctx: &RuleContext) -> Vec<NewIssue> {
    let mut issues = Vec::new();
    for page in ctx.pages.iter().filter(|p| content_audited(p)) {
        let levels: Vec<u8> = page
            .heading_levels
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        for pair in levels.windows(2) {
            if pair[1] > pair[0] + 1 {
                issues.push(issue(
                    Some(page.id),
                    "heading_hierarchy_skip",
                    Severity::Low,
                    format!("Heading jumps from h{} to h{}", pair[0], pair[1]),
                    None,
                ));
                break;
            }
        }
    }
    issues
}

fn missing_viewport(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.pages
        .iter()
        .filter(|page| content_audited(page) && !page.has_viewport)
        .map(|page| {
            issue(
                Some(page.id),
                "missing_viewport",
                Severity::Medium,
                "Page has no viewport meta tag".to_string(),
                None,
            )
        })
        .collect()
}

fn orphan_pages(ctx: &RuleContext) -> Vec<NewIssue> {
    let mut issues = Vec::new();
    for page in ctx.pages.iter().filter(|p| audited(p)) {
        // The seed has no in-links by construction
        if page.url == ctx.seed_url {
            continue;
        }
        let has_inlink = ctx.links.iter().any(|link| {
            link.is_internal
                && link.source_page_id != page.id
                && (link.target_url == page.url
                    || Some(link.target_url.as_str()) == page.final_url.as_deref())
        });
        if !has_inlink {
            issues.push(issue(
                Some(page.id),
                "orphan_page",
                Severity::Medium,
                "No internal link points at this page".to_string(),
                None,
            ));
        }
    }
    issues
}

fn missing_canonical(ctx: &RuleContext) -> Vec<NewIssue> {
    ctx.pages
        .iter()
        .filter(|page| content_audited(page) && page.canonical.is_none())
        .map(|page| {
            issue(
                Some(page.id),
                "missing_canonical",
                Severity::Low,
                "Page has no canonical link".to_string(),
                None,
            )
        })
        .collect()
}
