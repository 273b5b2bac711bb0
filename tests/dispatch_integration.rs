//! Integration tests for dispatch through the real HTTP executors.
//!
//! Each test spins up Axum stub upstreams (and the relay where needed) on
//! random ports and drives the router the way a front-end would.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use builder_buddy::agent::{Dispatch, IntentRouter};
use builder_buddy::config::BuddyConfig;
use builder_buddy::executors::insert::{SECTION_CONFIRMATION, SECTION_HEADING};
use builder_buddy::executors::mock::GREETING_REPLY;
use builder_buddy::executors::{Failure, HttpExecutor};
use builder_buddy::host::{ContentNode, HostDocument};
use builder_buddy::relay;
use builder_buddy::transcript::{
    Document, SearchResult, Sender, SessionState, Source, TranscriptContent,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Host double that records each insertion call separately.
#[derive(Default)]
struct RecordingHost {
    calls: std::sync::Mutex<Vec<Vec<ContentNode>>>,
}

impl HostDocument for RecordingHost {
    fn insert_blocks(&self, blocks: Vec<ContentNode>) {
        self.calls.lock().unwrap().push(blocks);
    }
}

/// Serve `app` on a random port and return its base URL.
async fn start_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://{addr}")
}

/// Site search that returns two hits for anything but "zzz".
async fn start_search() -> String {
    let app = Router::new().route(
        "/wp-json/wp/v2/search",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("search").map(String::as_str) == Some("zzz") {
                return Json(json!([]));
            }
            Json(json!([
                {"title": "Accordion Block", "url": "https://example.test/accordion"},
                {"title": {"rendered": "Accordion FAQ"}, "link": "https://example.test/faq"}
            ]))
        }),
    );
    start_stub(app).await + "/wp-json/wp/v2/search"
}

/// Document store: id 42 is complete, id 7 has no text.
async fn start_docs() -> String {
    let app = Router::new().route(
        "/docs/{id}",
        get(|Path(id): Path<String>| async move {
            match id.as_str() {
                "7" => Json(json!({"source": {"title": "Draft"}})),
                _ => Json(json!({"source": {"title": format!("Doc {id}"), "text": "Body text"}})),
            }
        }),
    );
    start_stub(app).await + "/docs/"
}

async fn start_assistant() -> String {
    let app = Router::new().route(
        "/ask",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "answer": format!("You asked: {}", body["question"].as_str().unwrap_or_default()),
                "sources": [{"title": "Handbook", "url": "https://example.test/handbook"}]
            }))
        }),
    );
    start_stub(app).await + "/ask"
}

/// Full stack: stub upstreams, a relay in front of the document store, and
/// a router wired to it all.
async fn start_stack(
    assistant: Option<String>,
) -> (IntentRouter, Arc<RecordingHost>) {
    let mut config = BuddyConfig {
        search_endpoint: Some(start_search().await),
        doc_fetch_endpoint: Some(start_docs().await),
        assistant_endpoint: assistant,
        assistant_api_key: Some(SecretString::from("test-key".to_string())),
        typing_delay: Duration::ZERO,
        ..BuddyConfig::default()
    };
    let relay_addr = relay::spawn("127.0.0.1:0", &config).await.unwrap();
    config.action_url = Some(relay::action_url(relay_addr));

    let host = Arc::new(RecordingHost::default());
    let remote = Arc::new(HttpExecutor::new(&config).unwrap());
    let router = IntentRouter::new(remote, host.clone(), &config);
    (router, host)
}

async fn send(router: &IntentRouter, session: &mut SessionState, text: &str) -> Dispatch {
    timeout(TEST_TIMEOUT, router.handle(session, text))
        .await
        .expect("dispatch hung")
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_results_keep_upstream_order() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::empty();

    let dispatch = send(&router, &mut session, "please search accordion").await;

    assert_eq!(dispatch, Dispatch::Answered);
    assert_eq!(session.len(), 2);
    assert_eq!(session.transcript()[0].sender, Sender::User);
    assert_eq!(
        session.last().unwrap().content,
        TranscriptContent::ResultList {
            results: vec![
                SearchResult {
                    title: "Accordion Block".into(),
                    url: "https://example.test/accordion".into()
                },
                SearchResult {
                    title: "Accordion FAQ".into(),
                    url: "https://example.test/faq".into()
                },
            ]
        }
    );
}

#[tokio::test]
async fn empty_search_is_plain_text() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::empty();

    send(&router, &mut session, "please search zzz").await;

    assert_eq!(
        session.last().unwrap().content.as_text(),
        Some("No results found for \"zzz\".")
    );
}

#[tokio::test]
async fn fetch_doc_goes_through_relay() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::new();

    let dispatch = send(&router, &mut session, "please fetch doc 42").await;

    assert_eq!(dispatch, Dispatch::Answered);
    assert_eq!(session.len(), 3);
    assert_eq!(
        session.last().unwrap().content,
        TranscriptContent::DocumentView {
            document: Document {
                title: "Doc 42".into(),
                text: "Body text".into()
            }
        }
    );
}

#[tokio::test]
async fn fetch_doc_without_text_is_invalid_response() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::empty();

    let dispatch = send(&router, &mut session, "please fetch doc 7").await;

    assert!(matches!(
        dispatch,
        Dispatch::Failed(Failure::InvalidResponse { .. })
    ));
    assert_eq!(session.len(), 2);
    assert_eq!(session.last().unwrap().sender, Sender::Assistant);
    assert!(!session.is_composing());
}

#[tokio::test]
async fn greeting_without_assistant_gets_canned_reply() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::empty();

    send(&router, &mut session, "hello").await;

    assert_eq!(session.last().unwrap().content.as_text(), Some(GREETING_REPLY));
}

#[tokio::test]
async fn question_goes_to_assistant_when_configured() {
    let (router, _) = start_stack(Some(start_assistant().await)).await;
    let mut session = SessionState::empty();

    send(&router, &mut session, "  what is a cover block?  ").await;

    assert_eq!(
        session.transcript()[0].content.as_text(),
        Some("what is a cover block?")
    );
    assert_eq!(
        session.last().unwrap().content,
        TranscriptContent::RichAnswer {
            text: "You asked: what is a cover block?".into(),
            sources: vec![Source {
                title: "Handbook".into(),
                url: "https://example.test/handbook".into()
            }]
        }
    );
}

#[tokio::test]
async fn section_insert_is_one_mutation() {
    let (router, host) = start_stack(None).await;
    let mut session = SessionState::empty();

    send(
        &router,
        &mut session,
        "Please add a section about electric shuffleboard",
    )
    .await;

    let calls = host.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    let cover = &calls[0][0];
    assert_eq!(cover.name, "core/cover");
    assert_eq!(cover.inner_blocks[0].attr_str("content"), Some(SECTION_HEADING));
    assert_eq!(
        session.last().unwrap().content.as_text(),
        Some(SECTION_CONFIRMATION)
    );
}

#[tokio::test]
async fn missing_search_term_only_prompts() {
    let (router, host) = start_stack(None).await;
    let mut session = SessionState::empty();

    let dispatch = send(&router, &mut session, "please search   ").await;

    assert!(matches!(dispatch, Dispatch::Prompted(_)));
    assert_eq!(session.len(), 1);
    assert_eq!(session.last().unwrap().sender, Sender::Assistant);
    assert!(host.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn question_through_relay_uses_server_key() {
    let upstream = Router::new().route(
        "/ask",
        post(|headers: axum::http::HeaderMap| async move {
            let key = headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({"answer": format!("key={key}")}))
        }),
    );
    let server_config = BuddyConfig {
        assistant_endpoint: Some(start_stub(upstream).await + "/ask"),
        assistant_api_key: Some(SecretString::from("server-key".to_string())),
        ..BuddyConfig::default()
    };
    let relay_addr = relay::bind_addr(&server_config).expect("assistant needs a relay");
    let relay_url = relay::action_url(relay::spawn(&relay_addr, &server_config).await.unwrap());

    let client_config = relay::client_config(&server_config, &relay_url);
    assert!(client_config.assistant_api_key.is_none());
    let host = Arc::new(RecordingHost::default());
    let remote = Arc::new(HttpExecutor::new(&client_config).unwrap());
    let router = IntentRouter::new(remote, host, &client_config);
    let mut session = SessionState::empty();

    send(&router, &mut session, "who am I talking to?").await;

    assert_eq!(
        session.last().unwrap().content,
        TranscriptContent::RichAnswer {
            text: "key=server-key".into(),
            sources: vec![]
        }
    );
}

#[tokio::test]
async fn fetch_doc_id_with_space_reaches_upstream() {
    let (router, _) = start_stack(None).await;
    let mut session = SessionState::empty();

    let dispatch = send(&router, &mut session, "please fetch doc my report").await;

    assert_eq!(dispatch, Dispatch::Answered);
    assert_eq!(
        session.last().unwrap().content,
        TranscriptContent::DocumentView {
            document: Document {
                title: "Doc my report".into(),
                text: "Body text".into()
            }
        }
    );
}

#[tokio::test]
async fn unconfigured_relay_surfaces_missing_settings() {
    let relay_url = relay::action_url(
        relay::spawn("127.0.0.1:0", &BuddyConfig::default())
            .await
            .unwrap(),
    );
    let config = BuddyConfig {
        action_url: Some(relay_url.clone()),
        assistant_endpoint: Some(format!("{relay_url}?action={}", relay::ASK_ACTION)),
        ask_via_relay: true,
        ..BuddyConfig::default()
    };
    let host = Arc::new(RecordingHost::default());
    let remote = Arc::new(HttpExecutor::new(&config).unwrap());
    let router = IntentRouter::new(remote, host, &config);
    let mut session = SessionState::empty();

    let fetch = send(&router, &mut session, "please fetch doc 42").await;
    assert_eq!(
        fetch,
        Dispatch::Failed(Failure::ConfigMissing {
            setting: "document fetch endpoint"
        })
    );

    let ask = send(&router, &mut session, "what is a cover block?").await;
    assert_eq!(
        ask,
        Dispatch::Failed(Failure::ConfigMissing {
            setting: "assistant endpoint"
        })
    );
    assert!(
        session
            .last()
            .unwrap()
            .content
            .as_text()
            .unwrap()
            .contains("assistant endpoint")
    );
}
