//! Intent router — turns one chat submission into exactly one executor call
//! and records the exchange in the session transcript.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::agent::intent::{Intent, IntentParser};
use crate::config::{BuddyConfig, FallbackPolicy};
use crate::executors::mock::mock_reply;
use crate::executors::{Failure, InsertExecutor, MissingPayload, RemoteExecutor};
use crate::host::HostDocument;
use crate::transcript::{ChatMessage, SessionState, TranscriptContent};

/// Assistant text recorded when an in-flight request is dropped.
pub const CANCELLED_REPLY: &str = "That request was cancelled before I could finish it.";

/// Typing indicator updates for a front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// An executor call has started.
    Typing,
    /// The call has finished (or was cancelled).
    Idle,
}

/// What `handle` did with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank input; nothing changed.
    Ignored,
    /// A reply is already being composed for this session; nothing changed.
    Busy,
    /// A command was missing its argument; only a prompt was appended.
    Prompted(MissingPayload),
    /// The executor succeeded.
    Answered,
    /// The executor failed; the failure text was appended.
    Failed(Failure),
}

pub struct IntentRouter {
    remote: Arc<dyn RemoteExecutor>,
    insert: InsertExecutor,
    fallback: FallbackPolicy,
    status_tx: Option<mpsc::UnboundedSender<StatusUpdate>>,
}

impl IntentRouter {
    pub fn new(
        remote: Arc<dyn RemoteExecutor>,
        host: Arc<dyn HostDocument>,
        config: &BuddyConfig,
    ) -> Self {
        Self {
            remote,
            insert: InsertExecutor::new(host, config.typing_delay),
            fallback: config.fallback,
            status_tx: None,
        }
    }

    /// Publish typing status on `tx`.
    pub fn with_status(mut self, tx: mpsc::UnboundedSender<StatusUpdate>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    /// Handle one submission.
    ///
    /// Holding `&mut SessionState` for the whole call means one session never
    /// has two dispatches in flight. Every submission that reaches an executor
    /// appends the user message and then exactly one assistant message, even
    /// when the returned future is dropped before completion.
    pub async fn handle(&self, session: &mut SessionState, raw: &str) -> Dispatch {
        let text = raw.trim();
        if text.is_empty() {
            return Dispatch::Ignored;
        }
        if session.is_composing() {
            tracing::warn!("Submission rejected: a reply is still being composed");
            return Dispatch::Busy;
        }

        let intent = IntentParser::parse(text);
        tracing::debug!(?intent, "Classified submission");

        if let Intent::MissingPayload(payload) = intent {
            let prompt = Failure::EmptyInput { payload }.into_content();
            session.push(ChatMessage::assistant(prompt));
            return Dispatch::Prompted(payload);
        }

        session.push(ChatMessage::user(text));
        let turn = Turn::begin(session, self.status_tx.as_ref());

        match self.execute(intent).await {
            Ok(content) => {
                turn.finish(content);
                Dispatch::Answered
            }
            Err(failure) => {
                tracing::warn!(?failure, "Executor failed");
                turn.finish(failure.clone().into_content());
                Dispatch::Failed(failure)
            }
        }
    }

    async fn execute(&self, intent: Intent) -> Result<TranscriptContent, Failure> {
        match intent {
            Intent::InsertContent(variant) => Ok(self.insert.insert(variant).await),
            Intent::FetchDoc { doc_id } => self.remote.fetch_doc(&doc_id).await,
            Intent::Search { query } => self.remote.search(&query).await,
            Intent::SmallTalk { text } => {
                if self.remote.assistant_configured() || self.fallback == FallbackPolicy::ConfigError
                {
                    self.remote.ask(&text).await
                } else {
                    Ok(mock_reply(&text))
                }
            }
            Intent::MissingPayload(payload) => Err(Failure::EmptyInput { payload }),
        }
    }
}

/// One in-flight executor call. Sets `composing` for its lifetime and
/// guarantees a single assistant reply, including on cancellation.
struct Turn<'a> {
    session: &'a mut SessionState,
    status_tx: Option<&'a mpsc::UnboundedSender<StatusUpdate>>,
    replied: bool,
}

impl<'a> Turn<'a> {
    fn begin(
        session: &'a mut SessionState,
        status_tx: Option<&'a mpsc::UnboundedSender<StatusUpdate>>,
    ) -> Self {
        session.set_composing(true);
        if let Some(tx) = status_tx {
            let _ = tx.send(StatusUpdate::Typing);
        }
        Self {
            session,
            status_tx,
            replied: false,
        }
    }

    fn finish(mut self, content: TranscriptContent) {
        self.session.push(ChatMessage::assistant(content));
        self.replied = true;
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        if !self.replied {
            tracing::warn!("In-flight request cancelled");
            self.session
                .push(ChatMessage::assistant(TranscriptContent::text(CANCELLED_REPLY)));
        }
        self.session.set_composing(false);
        if let Some(tx) = self.status_tx {
            let _ = tx.send(StatusUpdate::Idle);
        }
    }
}
