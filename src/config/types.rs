use serde::Deserialize;

/// Top-level configuration for a sitecheck run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Immutable per-run crawl parameters
///
/// Validated once at crawl start; the orchestrator never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum link depth for pages on the seed's registrable domain
    #[serde(rename = "internal-depth", default = "default_internal_depth")]
    pub internal_depth: u32,

    /// Whether links leaving the seed domain are crawled at all
    #[serde(rename = "follow-external-links", default)]
    pub follow_external_links: bool,

    /// Maximum link depth for external pages
    #[serde(rename = "external-depth", default = "default_external_depth")]
    pub external_depth: u32,

    /// Budget of distinct external registrable domains admitted to the frontier
    #[serde(rename = "max-external-links", default = "default_max_external")]
    pub max_external_links: usize,

    /// Hard cap on pages fetched in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u64,

    /// Wall-clock budget for the run, in seconds
    #[serde(rename = "max-runtime-seconds", default = "default_max_runtime")]
    pub max_runtime_seconds: u64,

    /// Number of concurrent fetch workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Crawl-wide request rate, shared across all workers
    #[serde(rename = "rate-limit-rps", default = "default_rate_limit")]
    pub rate_limit_rps: f64,

    /// Whether robots.txt disallow rules are honored
    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    /// When the headless-render collaborator is invoked
    #[serde(rename = "render-js", default)]
    pub render_js: RenderPolicy,

    /// User agent identity presented to the target site
    #[serde(rename = "user-agent-profile", default)]
    pub user_agent_profile: UserAgentProfile,

    /// Retries for transient fetch failures (timeout, connection reset)
    #[serde(rename = "fetch-retries", default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Per-request timeout, in seconds
    #[serde(rename = "fetch-timeout-seconds", default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// How long termination waits for in-flight fetches before abandoning them
    #[serde(rename = "grace-period-seconds", default = "default_grace_period")]
    pub grace_period_seconds: u64,
}

/// When to hand a URL to the headless-render collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPolicy {
    /// Never render; static fetch only
    Never,
    /// Render when the static response looks like a JS shell
    #[default]
    Auto,
    /// Render every page
    Always,
}

/// Preset user agent identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAgentProfile {
    #[default]
    Default,
    Chrome,
    Googlebot,
}

impl UserAgentProfile {
    /// The User-Agent header value for this profile
    pub fn ua_string(&self) -> &'static str {
        match self {
            Self::Default => "sitecheck/0.3 (+https://github.com/sitecheck/sitecheck)",
            Self::Chrome => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            }
            Self::Googlebot => {
                "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
            }
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Headless-render collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// HTTP endpoint of the render service; None disables rendering entirely
    pub endpoint: Option<String>,

    /// Render request timeout, in seconds
    #[serde(rename = "timeout-seconds", default = "default_render_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_render_timeout(),
        }
    }
}

/// Stale-crawl monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Minutes of heartbeat silence before a running crawl is reclaimed
    #[serde(rename = "running-timeout-minutes", default = "default_running_timeout")]
    pub running_timeout_minutes: i64,

    /// Minutes a pending crawl may sit unstarted before being reclaimed
    #[serde(rename = "queued-timeout-minutes", default = "default_queued_timeout")]
    pub queued_timeout_minutes: i64,

    /// Sweep interval, in minutes
    #[serde(rename = "sweep-interval-minutes", default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            running_timeout_minutes: default_running_timeout(),
            queued_timeout_minutes: default_queued_timeout(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_internal_depth() -> u32 {
    3
}

fn default_external_depth() -> u32 {
    1
}

fn default_max_external() -> usize {
    50
}

fn default_max_pages() -> u64 {
    500
}

fn default_max_runtime() -> u64 {
    1800
}

fn default_concurrency() -> usize {
    4
}

fn default_rate_limit() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_fetch_retries() -> u32 {
    2
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_grace_period() -> u64 {
    30
}

fn default_render_timeout() -> u64 {
    60
}

fn default_running_timeout() -> i64 {
    30
}

fn default_queued_timeout() -> i64 {
    60
}

fn default_sweep_interval() -> u64 {
    10
}
