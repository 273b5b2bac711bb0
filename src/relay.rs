//! Relay channel — a same-origin action endpoint that forwards requests to
//! the real upstreams with server-side credentials attached.
//!
//! One route, `/ajax`, dispatching on the `action` query parameter. Replies
//! use the `{"success": bool, "data": ...}` envelope. A missing setting is
//! reported as `{"code": "config_missing", "setting", "message"}` data so
//! clients can tell it apart from a transport problem.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::BuddyConfig;
use crate::error::{ConfigError, RelayError, Result};
use crate::executors::ask::AskRequest;
use crate::executors::fetch_doc::FETCH_DOC_ACTION;
use crate::executors::{
    AskExecutor, CONFIG_MISSING_CODE, FETCH_ENDPOINT_SETTING, Failure, build_client,
};

/// Action name for relayed assistant questions.
pub const ASK_ACTION: &str = "ask_builder_buddy";

/// Path the relay listens on.
pub const RELAY_PATH: &str = "/ajax";

/// Bind address used when a relay is needed but none was configured.
pub const LOCAL_RELAY_ADDR: &str = "127.0.0.1:0";

#[derive(Clone)]
struct RelayState {
    ask: AskExecutor,
    client: reqwest::Client,
    doc_fetch_endpoint: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ActionParams {
    action: String,
    #[serde(default)]
    doc_id: Option<String>,
}

/// Build the relay routes for `config`.
pub fn relay_routes(config: &BuddyConfig) -> std::result::Result<Router, ConfigError> {
    let client = build_client()?;
    let state = RelayState {
        ask: AskExecutor::new(client.clone(), config),
        client,
        doc_fetch_endpoint: config.doc_fetch_endpoint.clone(),
        timeout: config.request_timeout,
    };

    Ok(Router::new()
        .route(RELAY_PATH, get(dispatch_get).post(dispatch_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Bind `addr` and serve the relay in the background.
///
/// Returns the bound address, so `127.0.0.1:0` can be used.
pub async fn spawn(addr: &str, config: &BuddyConfig) -> Result<SocketAddr> {
    let app = relay_routes(config)?;
    let listener = TcpListener::bind(addr).await.map_err(|e| RelayError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })?;
    let local = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Relay stopped");
        }
    });

    tracing::info!(addr = %local, "Relay listening");
    Ok(local)
}

/// The action URL clients should use for a relay bound to `addr`.
pub fn action_url(addr: SocketAddr) -> String {
    format!("http://{addr}{RELAY_PATH}")
}

/// Where the binary should serve a relay for `config`, if anywhere.
///
/// An explicit `relay_addr` always wins. Otherwise a local relay is started
/// whenever the assistant is configured, or the document endpoint is
/// configured with no external action channel to reach it through.
pub fn bind_addr(config: &BuddyConfig) -> Option<String> {
    if let Some(addr) = &config.relay_addr {
        return Some(addr.clone());
    }
    let needs_fetch_relay = config.doc_fetch_endpoint.is_some() && config.action_url.is_none();
    (config.assistant_configured() || needs_fetch_relay).then(|| LOCAL_RELAY_ADDR.to_string())
}

/// The configuration the client side uses once a relay serves `relay_url`.
///
/// Questions go to the relay's ask action and the API key stays with the
/// relay. The document fetch uses the relay unless an action channel was
/// configured explicitly.
pub fn client_config(config: &BuddyConfig, relay_url: &str) -> BuddyConfig {
    let mut client = config.clone();
    if client.action_url.is_none() {
        client.action_url = Some(relay_url.to_string());
    }
    if config.assistant_configured() {
        client.assistant_endpoint = Some(format!("{relay_url}?action={ASK_ACTION}"));
        client.assistant_api_key = None;
        client.ask_via_relay = true;
    }
    client
}

fn success(data: Value) -> Response {
    Json(json!({"success": true, "data": data})).into_response()
}

fn failure(message: &str) -> Response {
    Json(json!({"success": false, "data": message})).into_response()
}

fn config_missing(setting: &str, message: &str) -> Response {
    Json(json!({
        "success": false,
        "data": {"code": CONFIG_MISSING_CODE, "setting": setting, "message": message}
    }))
    .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "data": message})),
    )
        .into_response()
}

async fn dispatch_get(
    State(state): State<RelayState>,
    params: std::result::Result<Query<ActionParams>, QueryRejection>,
) -> Response {
    let Ok(Query(params)) = params else {
        return bad_request("Missing action");
    };
    match params.action.as_str() {
        FETCH_DOC_ACTION => fetch_doc(&state, params.doc_id.as_deref()).await,
        other => unknown_action(other),
    }
}

async fn dispatch_post(
    State(state): State<RelayState>,
    params: std::result::Result<Query<ActionParams>, QueryRejection>,
    body: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Ok(Query(params)) = params else {
        return bad_request("Missing action");
    };
    if params.action != ASK_ACTION {
        return unknown_action(&params.action);
    }
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Relay received an unreadable question");
            return bad_request("Invalid request body");
        }
    };

    match state.ask.request(&request).await {
        Ok(payload) => success(payload),
        Err(e @ Failure::ConfigMissing { setting }) => config_missing(setting, &e.to_string()),
        Err(e) => failure(&e.to_string()),
    }
}

fn unknown_action(action: &str) -> Response {
    tracing::warn!(action, "Relay received unknown action");
    bad_request("Unknown action")
}

async fn fetch_doc(state: &RelayState, doc_id: Option<&str>) -> Response {
    let doc_id = doc_id.map(str::trim).unwrap_or_default();
    if doc_id.is_empty() {
        return failure("Missing doc_id");
    }
    let Some(endpoint) = state.doc_fetch_endpoint.as_deref() else {
        return config_missing(FETCH_ENDPOINT_SETTING, "No Fetch API URL is configured");
    };
    let Some(url) = upstream_url(endpoint, doc_id) else {
        tracing::warn!(endpoint, "Fetch API URL cannot take a document id");
        return failure("Invalid Fetch API URL");
    };

    tracing::info!(%url, "Relaying document fetch");

    let response = match state.client.get(url.clone()).timeout(state.timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, %url, "Upstream document fetch failed");
            return failure("Failed to reach API");
        }
    };

    // Undecodable upstream bodies are passed on as null, for the client to
    // reject.
    let data = response.json::<Value>().await.unwrap_or(Value::Null);
    success(data)
}

/// `endpoint` with `doc_id` appended as one percent-encoded path segment.
fn upstream_url(endpoint: &str, doc_id: &str) -> Option<reqwest::Url> {
    let mut url = reqwest::Url::parse(endpoint).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(doc_id);
    Some(url)
}
