//! CLI channel — stdin/stdout REPL around one chat session.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::agent::router::{IntentRouter, StatusUpdate};
use crate::host::DocumentBuffer;
use crate::transcript::{ChatMessage, Sender, SessionState};

/// Lines typed by the user.
pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// What a typed line asks the REPL to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Quit,
    ShowDocument,
    Chat(String),
}

impl CliCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "/quit" | "/exit" => Self::Quit,
            "/doc" | "/document" => Self::ShowDocument,
            _ => Self::Chat(line.to_string()),
        }
    }
}

/// A CLI channel that reads from stdin and writes the transcript to stdout.
pub struct CliChannel {
    router: IntentRouter,
    document: Arc<DocumentBuffer>,
    status_rx: Option<mpsc::UnboundedReceiver<StatusUpdate>>,
}

impl CliChannel {
    pub fn new(router: IntentRouter, document: Arc<DocumentBuffer>) -> Self {
        Self {
            router,
            document,
            status_rx: None,
        }
    }

    /// Show the typing indicator from `rx` on stderr.
    pub fn with_status(mut self, rx: mpsc::UnboundedReceiver<StatusUpdate>) -> Self {
        self.status_rx = Some(rx);
        self
    }

    /// Stream stdin lines until EOF.
    pub fn start() -> LineStream {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|line| (line, rx))
        }))
    }

    /// Run the REPL over `lines` until `/quit` or the stream ends.
    pub async fn run(mut self, mut lines: LineStream) -> SessionState {
        if let Some(mut rx) = self.status_rx.take() {
            tokio::spawn(async move {
                while let Some(update) = rx.recv().await {
                    if update == StatusUpdate::Typing {
                        eprintln!("⏳ Assistant is typing…");
                    }
                }
            });
        }

        let mut session = SessionState::new();
        print_messages(session.transcript());
        eprint!("> ");

        while let Some(line) = lines.next().await {
            match CliCommand::parse(&line) {
                CliCommand::Quit => break,
                CliCommand::ShowDocument => {
                    let markup = self.document.markup();
                    if markup.is_empty() {
                        println!("\n(the document is empty)\n");
                    } else {
                        println!("\n{markup}\n");
                    }
                }
                CliCommand::Chat(text) => {
                    let mark = session.len();
                    let dispatch = self.router.handle(&mut session, &text).await;
                    tracing::debug!(?dispatch, "Submission handled");
                    print_messages(session.since(mark));
                }
            }
            eprint!("> ");
        }

        session
    }
}

fn print_messages(messages: &[ChatMessage]) {
    for message in messages.iter().filter(|m| m.sender == Sender::Assistant) {
        println!("\n{}\n", format_message(message));
    }
}

/// One transcript entry as terminal text.
pub fn format_message(message: &ChatMessage) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "Builder Buddy",
    };
    format!("{who}: {}", message.content)
}
