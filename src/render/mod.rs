//! JavaScript rendering service client
//!
//! Pages that look like empty JavaScript shells can be re-fetched through
//! an external rendering service that runs a headless browser and returns
//! the post-execution HTML. The service is optional; when no endpoint is
//! configured, rendering is disabled and static bodies are used as-is.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::RenderConfig;
use crate::{Result, SitecheckError};

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
}

/// Client for the HTML rendering service
pub struct RenderClient {
    client: Client,
    endpoint: String,
}

impl RenderClient {
    /// Builds a client from config, or None when rendering is not configured
    pub fn from_config(config: &RenderConfig) -> Result<Option<Self>> {
        let endpoint = match &config.endpoint {
            Some(e) => e.clone(),
            None => return Ok(None),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Some(Self { client, endpoint }))
    }

    #[cfg(test)]
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Renders a URL and returns the resulting HTML
    ///
    /// Any failure is terminal for the URL being rendered; the page is
    /// recorded as a fetch error rather than retried.
    pub async fn render(&self, url: &str) -> Result<String> {
        debug!(url, "requesting render");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RenderRequest { url })
            .send()
            .await
            .map_err(|e| SitecheckError::Render {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SitecheckError::Render {
                url: url.to_string(),
                message: format!("render service returned {}", response.status()),
            });
        }

        response.text().await.map_err(|e| SitecheckError::Render {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
