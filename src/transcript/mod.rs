//! Transcript store — the ordered message list and the typing flag of one
//! chat panel session.

pub mod render;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting shown when a panel opens.
pub const GREETING: &str =
    "Hello! I'm Builder Buddy, your friendly assistant. You can chat with me here.";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single site search hit, in upstream relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// A source backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// A fetched document. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub text: String,
}

/// What a message displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptContent {
    PlainText { text: String },
    ResultList { results: Vec<SearchResult> },
    DocumentView { document: Document },
    RichAnswer { text: String, sources: Vec<Source> },
}

impl TranscriptContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    /// The plain text, if this is a `PlainText` message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::PlainText { text } => Some(text),
            _ => None,
        }
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub content: TranscriptContent,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, content: TranscriptContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content,
            sent_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, TranscriptContent::text(text))
    }

    pub fn assistant(content: TranscriptContent) -> Self {
        Self::new(Sender::Assistant, content)
    }
}

/// State of one chat panel: the append-only transcript and whether the
/// assistant is composing a reply.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    transcript: Vec<ChatMessage>,
    composing: bool,
}

impl SessionState {
    /// A session opened with the assistant greeting.
    pub fn new() -> Self {
        let mut session = Self::empty();
        session.push(ChatMessage::assistant(TranscriptContent::text(GREETING)));
        session
    }

    /// A session with no messages at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.transcript.last()
    }

    /// Messages appended after the first `from` entries.
    pub fn since(&self, from: usize) -> &[ChatMessage] {
        self.transcript.get(from..).unwrap_or(&[])
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub(crate) fn set_composing(&mut self, composing: bool) {
        self.composing = composing;
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }
}
