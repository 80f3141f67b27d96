//! Configuration loading and validation
//!
//! The crawl configuration is read from a TOML file once at startup,
//! validated, hashed, and never mutated afterwards.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, CrawlConfig, MonitorConfig, OutputConfig, RenderConfig, RenderPolicy,
    UserAgentProfile,
};
pub use validation::validate;

/// Builds a config with sane test values around the given seed URL
#[cfg(test)]
pub fn test_config(seed_url: &str) -> Config {
    Config {
        crawl: CrawlConfig {
            seed_url: seed_url.to_string(),
            internal_depth: 2,
            follow_external_links: false,
            external_depth: 1,
            max_external_links: 10,
            max_pages: 100,
            max_runtime_seconds: 60,
            concurrency: 2,
            rate_limit_rps: 50.0,
            respect_robots_txt: false,
            render_js: RenderPolicy::Never,
            user_agent_profile: UserAgentProfile::Default,
            fetch_retries: 1,
            fetch_timeout_seconds: 5,
            grace_period_seconds: 5,
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        render: RenderConfig::default(),
        monitor: MonitorConfig::default(),
    }
}
