//! HTML parser for extracting page content, links, and images
//!
//! This module handles parsing fetched HTML to extract:
//! - Links to follow, with anchor text and navigation context scores
//! - Images with alt text and dimensions
//! - Page metadata: title, h1, meta description, canonical, viewport
//! - Visible text for word counts and content fingerprints

use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use url::Url;

use crate::url::normalize;

/// Maximum characters kept from a page's visible text
const EXCERPT_CHARS: usize = 500;

/// Maximum characters kept from a link's anchor text
const ANCHOR_CHARS: usize = 200;

/// URL path prefixes that mark a page as a primary site page
const PRIMARY_PATHS: &[&str] = &[
    "/about", "/contact", "/pricing", "/services", "/products", "/features", "/team", "/faq",
    "/blog",
];

/// A link extracted from a page
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    /// Normalized absolute target URL
    pub url: Url,
    pub anchor_text: Option<String>,
    pub is_nofollow: bool,
    /// Navigation context score of the link's placement, 0 for body links
    pub nav_score: i64,
}

/// An image extracted from a page
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Absolute image URL
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Everything extracted from one HTML document
#[derive(Debug, Clone)]
pub struct PageExtract {
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub has_viewport: bool,
    pub word_count: i64,
    pub text_excerpt: Option<String>,
    pub content_hash: String,
    /// Heading levels in document order, e.g. [1, 2, 2, 3]
    pub heading_levels: Vec<u8>,
    pub links: Vec<ExtractedLink>,
    pub images: Vec<ExtractedImage>,
}

/// Parses an HTML document fetched from `base_url`
pub fn parse_page(html: &str, base_url: &Url) -> PageExtract {
    let document = Html::parse_document(html);

    let text = visible_text(&document);
    let word_count = text.split_whitespace().count() as i64;
    let text_excerpt = if text.is_empty() {
        None
    } else {
        Some(text.chars().take(EXCERPT_CHARS).collect())
    };

    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    let content_hash = hex::encode(hasher.finalize());

    PageExtract {
        title: select_text(&document, "title"),
        h1: select_text(&document, "h1"),
        meta_description: select_attr(&document, "meta[name=\"description\"]", "content"),
        canonical: select_attr(&document, "link[rel=\"canonical\"]", "href"),
        has_viewport: select_attr(&document, "meta[name=\"viewport\"]", "content").is_some(),
        word_count,
        text_excerpt,
        content_hash,
        heading_levels: extract_heading_levels(&document),
        links: extract_links(&document, base_url),
        images: extract_images(&document, base_url),
    }
}

/// Whether a URL path identifies a primary site page
///
/// The root page and common top-level sections (about, contact, pricing and
/// similar) are weighted by the issue rules, so they are flagged at parse
/// time.
pub fn is_primary_path(url: &Url) -> bool {
    let path = url.path().trim_end_matches('/');
    if path.is_empty() {
        return true;
    }
    let lower = path.to_lowercase();
    PRIMARY_PATHS.iter().any(|p| lower == *p)
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects text from all nodes outside script, style, and head subtrees
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.nodes() {
        let text = match node.value().as_text() {
            Some(t) => t,
            None => continue,
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| {
                    matches!(
                        e.name(),
                        "script" | "style" | "noscript" | "template" | "head"
                    )
                })
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(trimmed);
        }
    }
    out
}

fn extract_heading_levels(document: &Html) -> Vec<u8> {
    let selector = match Selector::parse("h1, h2, h3, h4, h5, h6") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().name().strip_prefix('h')?.parse::<u8>().ok())
        .collect()
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<ExtractedLink> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            continue;
        }

        let resolved = match base_url.join(href) {
            Ok(u) => u,
            Err(_) => continue,
        };
        let url = match normalize(resolved) {
            Ok(u) => u,
            Err(_) => continue,
        };

        let anchor_text: String = element.text().collect::<String>().trim().to_string();
        let anchor_text = if anchor_text.is_empty() {
            None
        } else {
            Some(anchor_text.chars().take(ANCHOR_CHARS).collect())
        };

        let is_nofollow = element
            .value()
            .attr("rel")
            .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("nofollow")))
            .unwrap_or(false);

        links.push(ExtractedLink {
            url,
            anchor_text,
            is_nofollow,
            nav_score: nav_score_for(&element),
        });
    }
    links
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ExtractedImage> {
    let selector = match Selector::parse("img[src]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut images = Vec::new();
    for element in document.select(&selector) {
        let src = match element.value().attr("src") {
            Some(s) => s.trim(),
            None => continue,
        };
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        let resolved = match base_url.join(src) {
            Ok(u) => u.to_string(),
            Err(_) => continue,
        };

        images.push(ExtractedImage {
            src: resolved,
            // A missing alt attribute differs from alt=""; both are kept
            alt: element.value().attr("alt").map(|a| a.trim().to_string()),
            width: parse_dimension(element.value().attr("width")),
            height: parse_dimension(element.value().attr("height")),
        });
    }
    images
}

fn parse_dimension(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

/// Scores a link's navigation context from its ancestor elements
///
/// The highest-scoring ancestor wins: a link inside a `<nav>` scores 10
/// even when that nav sits inside a footer.
fn nav_score_for(element: &ElementRef) -> i64 {
    let mut best = 0;
    for ancestor in element.ancestors() {
        if let Some(el) = ancestor.value().as_element() {
            best = best.max(score_element(el));
        }
    }
    best
}

fn score_element(el: &Element) -> i64 {
    if el.name() == "nav" {
        return 10;
    }
    if el
        .attr("role")
        .map(|r| r.eq_ignore_ascii_case("navigation"))
        .unwrap_or(false)
    {
        return 10;
    }

    let classes: Vec<String> = el
        .attr("class")
        .map(|c| c.split_whitespace().map(|s| s.to_lowercase()).collect())
        .unwrap_or_default();
    if classes
        .iter()
        .any(|c| c == "nav" || c == "navbar" || c == "main-menu")
    {
        return 9;
    }
    if el.name() == "header" {
        return 8;
    }
    if classes.iter().any(|c| c == "menu") {
        return 8;
    }
    if classes.iter().any(|c| c.contains("breadcrumb")) {
        return 7;
    }
    if el.name() == "footer" {
        return 5;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_extracts_metadata() {
        let html = r#"<html><head>
            <title>Welcome</title>
            <meta name="description" content="A fine site">
            <meta name="viewport" content="width=device-width">
            <link rel="canonical" href="https://example.com/">
        </head><body><h1>Hello</h1><p>Some body text here.</p></body></html>"#;
        let page = parse_page(html, &base());

        assert_eq!(page.title.as_deref(), Some("Welcome"));
        assert_eq!(page.h1.as_deref(), Some("Hello"));
        assert_eq!(page.meta_description.as_deref(), Some("A fine site"));
        assert_eq!(page.canonical.as_deref(), Some("https://example.com/"));
        assert!(page.has_viewport);
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let page = parse_page("<html><body><p>text</p></body></html>", &base());
        assert!(page.title.is_none());
        assert!(page.h1.is_none());
        assert!(page.meta_description.is_none());
        assert!(!page.has_viewport);
    }

    #[test]
    fn test_word_count_skips_scripts() {
        let html = r#"<html><head><script>var a = "one two three four";</script>
            <style>.x { color: red }</style></head>
            <body><p>alpha beta gamma</p></body></html>"#;
        let page = parse_page(html, &base());
        assert_eq!(page.word_count, 3);
        assert_eq!(page.text_excerpt.as_deref(), Some("alpha beta gamma"));
    }

    #[test]
    fn test_link_resolution_and_filtering() {
        let html = r##"<html><body>
            <a href="/about">About us</a>
            <a href="https://other.example/page">Elsewhere</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a href="#section">Anchor</a>
            <a href="/file.zip" download>Download</a>
        </body></html>"##;
        let page = parse_page(html, &base());

        let urls: Vec<&str> = page.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/about", "https://other.example/page"]
        );
        assert_eq!(page.links[0].anchor_text.as_deref(), Some("About us"));
    }

    #[test]
    fn test_nofollow_detection() {
        let html = r#"<a href="/a" rel="nofollow">x</a><a href="/b" rel="noopener">y</a>"#;
        let page = parse_page(html, &base());
        assert!(page.links[0].is_nofollow);
        assert!(!page.links[1].is_nofollow);
    }

    #[test]
    fn test_nav_scores() {
        let html = r#"<html><body>
            <nav><a href="/nav-link">n</a></nav>
            <header><a href="/header-link">h</a></header>
            <div class="navbar"><a href="/navbar-link">b</a></div>
            <div class="menu"><a href="/menu-link">m</a></div>
            <footer><a href="/footer-link">f</a></footer>
            <p><a href="/body-link">p</a></p>
        </body></html>"#;
        let page = parse_page(html, &base());

        let score = |path: &str| {
            page.links
                .iter()
                .find(|l| l.url.path() == path)
                .map(|l| l.nav_score)
                .unwrap()
        };
        assert_eq!(score("/nav-link"), 10);
        assert_eq!(score("/header-link"), 8);
        assert_eq!(score("/navbar-link"), 9);
        assert_eq!(score("/menu-link"), 8);
        assert_eq!(score("/footer-link"), 5);
        assert_eq!(score("/body-link"), 0);
    }

    #[test]
    fn test_nav_inside_footer_takes_max() {
        let html = r#"<footer><nav><a href="/x">x</a></nav></footer>"#;
        let page = parse_page(html, &base());
        assert_eq!(page.links[0].nav_score, 10);
    }

    #[test]
    fn test_images() {
        let html = r#"<body>
            <img src="/logo.png" alt="Logo" width="64" height="32">
            <img src="/decor.png" alt="">
            <img src="/plain.png">
        </body>"#;
        let page = parse_page(html, &base());

        assert_eq!(page.images.len(), 3);
        assert_eq!(page.images[0].src, "https://example.com/logo.png");
        assert_eq!(page.images[0].alt.as_deref(), Some("Logo"));
        assert_eq!(page.images[0].width, Some(64));
        assert_eq!(page.images[0].height, Some(32));
        // Empty alt is decorative, distinct from a missing attribute
        assert_eq!(page.images[1].alt.as_deref(), Some(""));
        assert!(page.images[2].alt.is_none());
    }

    #[test]
    fn test_heading_levels_in_order() {
        let html = "<h1>a</h1><h2>b</h2><h2>c</h2><h4>d</h4>";
        let page = parse_page(html, &base());
        assert_eq!(page.heading_levels, vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_primary_paths() {
        let primary = |s: &str| is_primary_path(&Url::parse(s).unwrap());
        assert!(primary("https://example.com/"));
        assert!(primary("https://example.com/about"));
        assert!(primary("https://example.com/pricing/"));
        assert!(primary("https://example.com/Contact"));
        assert!(!primary("https://example.com/blog/some-post"));
        assert!(!primary("https://example.com/random"));
    }

    #[test]
    fn test_content_hash_differs() {
        let a = parse_page("<html><p>one</p></html>", &base());
        let b = parse_page("<html><p>two</p></html>", &base());
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
