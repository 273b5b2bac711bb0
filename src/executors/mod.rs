//! Executors — the side effects behind each intent.
//!
//! The three network executors sit behind the [`RemoteExecutor`] seam so the
//! router can be driven by [`HttpExecutor`] in production and by a stub in
//! tests. Content insertion and the mock reply need no network and are called
//! directly.

pub mod ask;
pub mod fetch_doc;
pub mod insert;
pub mod mock;
pub mod search;

pub use ask::AskExecutor;
pub use fetch_doc::FetchDocExecutor;
pub use insert::{InsertExecutor, InsertVariant};
pub use search::SearchExecutor;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::BuddyConfig;
use crate::error::ConfigError;
use crate::transcript::TranscriptContent;

/// A payload the user left out after a recognised command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPayload {
    DocumentId,
    SearchTerm,
}

impl MissingPayload {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::DocumentId => {
                "Which document should I fetch? Give me its id, like \"please fetch doc 42\"."
            }
            Self::SearchTerm => {
                "What would you like me to search for? Try \"please search\" followed by a term."
            }
        }
    }
}

/// Why an executor could not produce a result.
///
/// `Display` is the text shown to the user; the fields carry detail for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("I can't do that yet because no {setting} is configured. Please add it in the Builder Buddy settings.")]
    ConfigMissing { setting: &'static str },

    #[error("Sorry, I had trouble reaching the Builder Buddy service. Please try again.")]
    Transport { service: &'static str, reason: String },

    #[error("The {service} responded, but the response was missing {missing}.")]
    InvalidResponse {
        service: &'static str,
        missing: &'static str,
    },

    #[error("{}", .payload.prompt())]
    EmptyInput { payload: MissingPayload },
}

impl Failure {
    pub(crate) fn transport(service: &'static str, reason: impl ToString) -> Self {
        Self::Transport {
            service,
            reason: reason.to_string(),
        }
    }

    /// The assistant message this failure turns into.
    pub fn into_content(self) -> TranscriptContent {
        TranscriptContent::text(self.to_string())
    }
}

/// The network-facing executors, as the router sees them.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Whether an assistant endpoint is configured for small-talk.
    fn assistant_configured(&self) -> bool;

    /// Ask the assistant a free-text question.
    async fn ask(&self, question: &str) -> Result<TranscriptContent, Failure>;

    /// Search the site.
    async fn search(&self, query: &str) -> Result<TranscriptContent, Failure>;

    /// Fetch a document by id through the action channel.
    async fn fetch_doc(&self, doc_id: &str) -> Result<TranscriptContent, Failure>;
}

/// Production executors backed by one shared HTTP client.
#[derive(Clone)]
pub struct HttpExecutor {
    ask: AskExecutor,
    search: SearchExecutor,
    fetch: FetchDocExecutor,
}

impl HttpExecutor {
    pub fn new(config: &BuddyConfig) -> Result<Self, ConfigError> {
        let client = build_client()?;
        Ok(Self {
            ask: AskExecutor::new(client.clone(), config),
            search: SearchExecutor::new(client.clone(), config),
            fetch: FetchDocExecutor::new(client, config),
        })
    }
}

#[async_trait]
impl RemoteExecutor for HttpExecutor {
    fn assistant_configured(&self) -> bool {
        self.ask.is_configured()
    }

    async fn ask(&self, question: &str) -> Result<TranscriptContent, Failure> {
        self.ask.ask(question).await
    }

    async fn search(&self, query: &str) -> Result<TranscriptContent, Failure> {
        self.search.search(query).await
    }

    async fn fetch_doc(&self, doc_id: &str) -> Result<TranscriptContent, Failure> {
        self.fetch.fetch_doc(doc_id).await
    }
}

pub(crate) fn build_client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(concat!("builder-buddy/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Settings the relay can report as missing.
pub const ASSISTANT_ENDPOINT_SETTING: &str = "assistant endpoint";
pub const ASSISTANT_KEY_SETTING: &str = "assistant API key";
pub const FETCH_ENDPOINT_SETTING: &str = "document fetch endpoint";

/// `code` of a relay error envelope that names a missing setting.
pub const CONFIG_MISSING_CODE: &str = "config_missing";

const RELAY_SETTINGS: [&str; 3] = [
    ASSISTANT_ENDPOINT_SETTING,
    ASSISTANT_KEY_SETTING,
    FETCH_ENDPOINT_SETTING,
];

/// Why the relay's envelope did not carry a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// The relay is missing one of its own settings.
    ConfigMissing(&'static str),
    /// Anything else, as the relay's message.
    Other(String),
}

impl Rejection {
    pub(crate) fn into_failure(self, service: &'static str) -> Failure {
        match self {
            Self::ConfigMissing(setting) => Failure::ConfigMissing { setting },
            Self::Other(reason) => Failure::transport(service, reason),
        }
    }
}

/// Strip the relay's `{success, data}` envelope if there is one.
///
/// A bare payload passes through untouched. Error data is either the
/// relay's message or `{code: "config_missing", setting, message}`.
pub(crate) fn unwrap_envelope(body: Value) -> Result<Value, Rejection> {
    let Some(success) = body.get("success").and_then(Value::as_bool) else {
        return Ok(body);
    };
    let data = body.get("data").cloned().unwrap_or(Value::Null);
    if !success {
        return Err(rejection(&data));
    }
    if data.is_object() {
        Ok(data)
    } else {
        Err(Rejection::Other("relay envelope has no data object".to_string()))
    }
}

fn rejection(data: &Value) -> Rejection {
    if let Some(message) = data.as_str() {
        return Rejection::Other(message.to_string());
    }
    if data.get("code").and_then(Value::as_str) == Some(CONFIG_MISSING_CODE) {
        let named = data.get("setting").and_then(Value::as_str).unwrap_or_default();
        let setting = RELAY_SETTINGS
            .iter()
            .find(|s| **s == named)
            .copied()
            .unwrap_or("relay setting");
        return Rejection::ConfigMissing(setting);
    }
    Rejection::Other(
        data.get("message")
            .and_then(Value::as_str)
            .unwrap_or("relay reported failure")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bare_payload_passes_through() {
        let body = json!({"answer": "yes"});
        assert_eq!(unwrap_envelope(body.clone()), Ok(body));
    }

    #[test]
    fn test_successful_envelope_is_unwrapped() {
        let body = json!({"success": true, "data": {"source": {"title": "T"}}});
        assert_eq!(
            unwrap_envelope(body),
            Ok(json!({"source": {"title": "T"}}))
        );
    }

    #[test]
    fn test_failed_envelope_carries_relay_message() {
        let body = json!({"success": false, "data": "Failed to reach API"});
        assert_eq!(
            unwrap_envelope(body),
            Err(Rejection::Other("Failed to reach API".to_string()))
        );
    }

    #[test]
    fn test_config_missing_envelope_names_the_setting() {
        let body = json!({
            "success": false,
            "data": {
                "code": "config_missing",
                "setting": "document fetch endpoint",
                "message": "No Fetch API URL is configured"
            }
        });
        let rejection = unwrap_envelope(body).unwrap_err();
        assert_eq!(rejection, Rejection::ConfigMissing(FETCH_ENDPOINT_SETTING));
        assert_eq!(
            rejection.into_failure("document service"),
            Failure::ConfigMissing {
                setting: FETCH_ENDPOINT_SETTING
            }
        );
    }

    #[test]
    fn test_unknown_missing_setting_stays_config_missing() {
        let body = json!({"success": false, "data": {"code": "config_missing", "setting": "?"}});
        assert_eq!(
            unwrap_envelope(body),
            Err(Rejection::ConfigMissing("relay setting"))
        );
    }

    #[test]
    fn test_structured_error_without_code_uses_message() {
        let body = json!({"success": false, "data": {"message": "Unknown action"}});
        assert_eq!(
            unwrap_envelope(body),
            Err(Rejection::Other("Unknown action".to_string()))
        );
    }

    #[test]
    fn test_envelope_without_data_is_rejected() {
        assert!(unwrap_envelope(json!({"success": true})).is_err());
    }

    #[test]
    fn test_failure_messages_are_user_facing() {
        let missing = Failure::ConfigMissing {
            setting: ASSISTANT_ENDPOINT_SETTING,
        };
        assert!(missing.to_string().contains("assistant endpoint"));

        let transport = Failure::transport("assistant", "connection refused");
        assert!(transport.to_string().contains("trouble reaching"));
        assert!(!transport.to_string().contains("connection refused"));

        let prompt = Failure::EmptyInput {
            payload: MissingPayload::SearchTerm,
        };
        assert_eq!(prompt.to_string(), MissingPayload::SearchTerm.prompt());
    }
}
