//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Timeout for the assistant call.
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout for search, document fetch and relay upstream calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause before confirming a content insertion.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1200);

/// What the router does with small-talk when no assistant endpoint is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Answer with a canned keyword-based reply.
    #[default]
    MockReply,
    /// Send it to the assistant executor anyway, which reports the missing
    /// configuration.
    ConfigError,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" | "mock_reply" => Ok(Self::MockReply),
            "error" | "config_error" => Ok(Self::ConfigError),
            other => Err(ConfigError::InvalidValue {
                key: "BUILDER_BUDDY_FALLBACK".to_string(),
                message: format!("expected 'mock' or 'error', got '{other}'"),
            }),
        }
    }
}

/// Builder Buddy configuration.
///
/// Every endpoint is optional; `None` means "not configured", which is a
/// valid state rather than an error.
#[derive(Debug, Clone)]
pub struct BuddyConfig {
    /// Assistant endpoint that answers free-text questions.
    pub assistant_endpoint: Option<String>,
    /// API key sent with assistant requests.
    pub assistant_api_key: Option<SecretString>,
    /// `assistant_endpoint` is a relay that attaches the key itself.
    pub ask_via_relay: bool,
    /// Site search endpoint (called directly, not through the relay).
    pub search_endpoint: Option<String>,
    /// Upstream document endpoint; the document id is appended to it.
    pub doc_fetch_endpoint: Option<String>,
    /// Action-dispatch channel the document fetch is addressed to.
    pub action_url: Option<String>,
    /// Small-talk handling when no assistant is configured.
    pub fallback: FallbackPolicy,
    pub ask_timeout: Duration,
    pub request_timeout: Duration,
    /// Artificial pause before a content insertion is confirmed.
    pub typing_delay: Duration,
    /// Address the binary serves the relay on, if any.
    pub relay_addr: Option<String>,
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self {
            assistant_endpoint: None,
            assistant_api_key: None,
            ask_via_relay: false,
            search_endpoint: None,
            doc_fetch_endpoint: None,
            action_url: None,
            fallback: FallbackPolicy::default(),
            ask_timeout: DEFAULT_ASK_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            typing_delay: DEFAULT_TYPING_DELAY,
            relay_addr: None,
        }
    }
}

impl BuddyConfig {
    /// Load configuration from `BUILDER_BUDDY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        let fallback = match get("BUILDER_BUDDY_FALLBACK") {
            Some(raw) => raw.parse()?,
            None => FallbackPolicy::default(),
        };

        Ok(Self {
            assistant_endpoint: get("BUILDER_BUDDY_ENDPOINT"),
            assistant_api_key: get("BUILDER_BUDDY_API_KEY").map(SecretString::from),
            ask_via_relay: false,
            search_endpoint: get("BUILDER_BUDDY_SEARCH_ENDPOINT"),
            doc_fetch_endpoint: get("BUILDER_BUDDY_FETCH_ENDPOINT"),
            action_url: get("BUILDER_BUDDY_ACTION_URL"),
            fallback,
            ask_timeout: parse_duration(
                "BUILDER_BUDDY_ASK_TIMEOUT_SECS",
                get("BUILDER_BUDDY_ASK_TIMEOUT_SECS"),
                Duration::from_secs,
                DEFAULT_ASK_TIMEOUT,
            )?,
            request_timeout: parse_duration(
                "BUILDER_BUDDY_REQUEST_TIMEOUT_SECS",
                get("BUILDER_BUDDY_REQUEST_TIMEOUT_SECS"),
                Duration::from_secs,
                DEFAULT_REQUEST_TIMEOUT,
            )?,
            typing_delay: parse_duration(
                "BUILDER_BUDDY_TYPING_DELAY_MS",
                get("BUILDER_BUDDY_TYPING_DELAY_MS"),
                Duration::from_millis,
                DEFAULT_TYPING_DELAY,
            )?,
            relay_addr: get("BUILDER_BUDDY_RELAY_ADDR"),
        })
    }

    /// Whether small-talk can go to a real assistant.
    pub fn assistant_configured(&self) -> bool {
        self.assistant_endpoint.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_duration(
    key: &str,
    raw: Option<String>,
    unit: fn(u64) -> Duration,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map(unit)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}': {e}"),
            }),
    }
}
