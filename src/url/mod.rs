//! Domain policy: URL normalization, internality, and the static denylist
//!
//! Pure functions consulted by the frontier before any URL is admitted.
//! Blacklisted hosts are rejected at enqueue time so they are never dialed.

mod domain;
mod normalize;

pub use domain::{is_internal, registrable_domain};
pub use normalize::{normalize, normalize_url};

use url::Url;

/// Registrable domains that are never crawled
///
/// Social platforms (infinite content, ToS issues), analytics/tracking hosts,
/// and ad networks. A safety net for runs with external following enabled.
const BLACKLISTED_DOMAINS: &[&str] = &[
    // Social media
    "facebook.com",
    "fb.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "pinterest.com",
    "snapchat.com",
    "reddit.com",
    "tumblr.com",
    "whatsapp.com",
    "telegram.org",
    "discord.com",
    "twitch.tv",
    "vimeo.com",
    "flickr.com",
    // Analytics and tracking
    "google-analytics.com",
    "googletagmanager.com",
    "doubleclick.net",
    "facebook.net",
    "amplitude.com",
    "segment.com",
    "segment.io",
    "hotjar.com",
    "fullstory.com",
    "mixpanel.com",
    "quantcast.com",
    "scorecardresearch.com",
    "chartbeat.com",
    // Ad networks
    "googlesyndication.com",
    "googleadservices.com",
    "adroll.com",
    "advertising.com",
    "taboola.com",
    "outbrain.com",
    "criteo.com",
    "adform.com",
    "openx.net",
    "rubiconproject.com",
    "pubmatic.com",
];

/// File extensions that are never fetched as pages
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".zip", ".rar", ".tar", ".gz",
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".mp3", ".mp4", ".avi", ".mov",
    ".wmv", ".flv", ".css", ".js", ".wasm",
];

/// Checks a URL against the static denylist
///
/// Matches at the registrable-domain boundary, so `m.facebook.com` is as
/// blacklisted as `facebook.com`.
pub fn is_blacklisted(url: &Url) -> bool {
    match registrable_domain(url) {
        Some(domain) => BLACKLISTED_DOMAINS.contains(&domain.as_str()),
        None => false,
    }
}

/// Returns true if the URL is a candidate page fetch at all
///
/// Rejects non-HTTP(S) schemes and paths that point at binary or asset files.
pub fn should_fetch(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    let path = url.path().to_lowercase();
    !SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
