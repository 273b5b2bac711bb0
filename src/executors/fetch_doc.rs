//! Document fetch: asks the action channel for a document by id.

use std::time::Duration;

use serde_json::Value;

use crate::config::BuddyConfig;
use crate::executors::{Failure, unwrap_envelope};
use crate::transcript::{TranscriptContent, render};

/// Action name the channel dispatches document fetches on.
pub const FETCH_DOC_ACTION: &str = "fetch_doc";

const SERVICE: &str = "document service";

#[derive(Clone)]
pub struct FetchDocExecutor {
    client: reqwest::Client,
    action_url: Option<String>,
    timeout: Duration,
}

impl FetchDocExecutor {
    pub fn new(client: reqwest::Client, config: &BuddyConfig) -> Self {
        Self {
            client,
            action_url: config.action_url.clone(),
            timeout: config.request_timeout,
        }
    }

    pub async fn fetch_doc(&self, doc_id: &str) -> Result<TranscriptContent, Failure> {
        let action_url = self.action_url.as_deref().ok_or(Failure::ConfigMissing {
            setting: "document fetch channel",
        })?;

        tracing::info!(doc_id, "Fetching document");

        let response = self
            .client
            .get(action_url)
            .timeout(self.timeout)
            .query(&[("action", FETCH_DOC_ACTION), ("doc_id", doc_id)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::warn!(error = %e, doc_id, "Document fetch failed");
                Failure::transport(SERVICE, e)
            })?;

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, doc_id, "Document fetch returned a non-JSON body");
            Failure::transport(SERVICE, e)
        })?;

        let payload = unwrap_envelope(body).map_err(|rejection| {
            tracing::warn!(?rejection, doc_id, "Relay could not fetch the document");
            rejection.into_failure(SERVICE)
        })?;

        let document = render::document(&payload).ok_or_else(|| {
            tracing::warn!(doc_id, "Document payload is missing title or text");
            Failure::InvalidResponse {
                service: SERVICE,
                missing: "a title or text",
            }
        })?;

        Ok(TranscriptContent::DocumentView { document })
    }
}
