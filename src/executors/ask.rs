//! POSTs a question to the assistant endpoint.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BuddyConfig;
use crate::executors::{
    ASSISTANT_ENDPOINT_SETTING, ASSISTANT_KEY_SETTING, Failure, unwrap_envelope,
};
use crate::transcript::{TranscriptContent, render};

/// Number of passages the assistant should ground its answer on.
pub const TOP_K: u32 = 3;

/// Header carrying the assistant API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const SERVICE: &str = "assistant";

/// Body sent to the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: u32,
    pub filters: Option<Value>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: TOP_K,
            filters: None,
        }
    }
}

#[derive(Clone)]
pub struct AskExecutor {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<SecretString>,
    /// The endpoint is the relay, which holds the key.
    relayed: bool,
    timeout: Duration,
}

impl AskExecutor {
    pub fn new(client: reqwest::Client, config: &BuddyConfig) -> Self {
        Self {
            client,
            endpoint: config.assistant_endpoint.clone(),
            api_key: config.assistant_api_key.clone(),
            relayed: config.ask_via_relay,
            timeout: config.ask_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Ask a question and render the answer.
    pub async fn ask(&self, question: &str) -> Result<TranscriptContent, Failure> {
        let payload = self.request(&AskRequest::new(question)).await?;
        Ok(render::answer(&payload))
    }

    /// Send a request and return the decoded answer payload as-is.
    ///
    /// Checks configuration before touching the network: a missing endpoint
    /// or key is reported without a request being made. Through the relay
    /// the key check happens server-side and comes back as the same failure.
    pub async fn request(&self, request: &AskRequest) -> Result<Value, Failure> {
        let endpoint = self.endpoint.as_deref().ok_or(Failure::ConfigMissing {
            setting: ASSISTANT_ENDPOINT_SETTING,
        })?;
        if !self.relayed && self.api_key.is_none() {
            return Err(Failure::ConfigMissing {
                setting: ASSISTANT_KEY_SETTING,
            });
        }

        tracing::info!(endpoint, top_k = request.top_k, relayed = self.relayed, "Asking assistant");

        let mut builder = self.client.post(endpoint).timeout(self.timeout);
        if let Some(key) = self.api_key.as_ref().filter(|_| !self.relayed) {
            builder = builder.header(API_KEY_HEADER, key.expose_secret());
        }
        let response = builder
            .json(request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::warn!(error = %e, "Assistant request failed");
                Failure::transport(SERVICE, e)
            })?;

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Assistant returned a non-JSON body");
            Failure::transport(SERVICE, e)
        })?;

        let payload = unwrap_envelope(body).map_err(|rejection| {
            tracing::warn!(?rejection, "Assistant relay rejected the request");
            rejection.into_failure(SERVICE)
        })?;

        if !payload.is_object() {
            tracing::warn!("Assistant payload is not a JSON object");
            return Err(Failure::transport(SERVICE, "payload is not an object"));
        }
        Ok(payload)
    }
}
