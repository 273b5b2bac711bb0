//! Site search: queries the search endpoint directly.

use std::time::Duration;

use serde_json::Value;

use crate::config::BuddyConfig;
use crate::executors::Failure;
use crate::transcript::{TranscriptContent, render};

/// Results requested per search.
pub const PER_PAGE: u32 = 3;

const SERVICE: &str = "search";

#[derive(Clone)]
pub struct SearchExecutor {
    client: reqwest::Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl SearchExecutor {
    pub fn new(client: reqwest::Client, config: &BuddyConfig) -> Self {
        Self {
            client,
            endpoint: config.search_endpoint.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Search for `query`. No hits is a successful answer, not a failure.
    pub async fn search(&self, query: &str) -> Result<TranscriptContent, Failure> {
        let endpoint = self.endpoint.as_deref().ok_or(Failure::ConfigMissing {
            setting: "search endpoint",
        })?;

        tracing::info!(endpoint, query, "Searching site");

        let per_page = PER_PAGE.to_string();
        let response = self
            .client
            .get(endpoint)
            .timeout(self.timeout)
            .query(&[("search", query), ("per_page", per_page.as_str())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::warn!(error = %e, "Search request failed");
                Failure::transport(SERVICE, e)
            })?;

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Search returned a non-JSON body");
            Failure::transport(SERVICE, e)
        })?;

        let results = render::search_results(&body);
        tracing::debug!(count = results.len(), "Search finished");
        Ok(render::search_content(query, results))
    }
}
