use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use builder_buddy::agent::IntentRouter;
use builder_buddy::channels::CliChannel;
use builder_buddy::config::BuddyConfig;
use builder_buddy::executors::HttpExecutor;
use builder_buddy::host::DocumentBuffer;
use builder_buddy::relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = BuddyConfig::from_env().context("Invalid configuration")?;

    // ── Relay ────────────────────────────────────────────────────────────
    let relay_url = match relay::bind_addr(&config) {
        Some(addr) => {
            let local = relay::spawn(&addr, &config)
                .await
                .with_context(|| format!("Failed to start relay on {addr}"))?;
            Some(relay::action_url(local))
        }
        None => None,
    };
    let client_config = match &relay_url {
        Some(url) => relay::client_config(&config, url),
        None => config.clone(),
    };

    eprintln!("🧱 Builder Buddy v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Assistant: {}",
        if config.assistant_configured() {
            config.assistant_endpoint.as_deref().unwrap_or_default()
        } else {
            "not configured (canned replies)"
        }
    );
    if let Some(url) = &relay_url {
        eprintln!("   Relay: {url}");
    }
    eprintln!("   Type a message and press Enter. /doc shows the page, /quit exits.\n");

    // ── Router ───────────────────────────────────────────────────────────
    let document = Arc::new(DocumentBuffer::new());
    let remote =
        Arc::new(HttpExecutor::new(&client_config).context("Failed to build HTTP client")?);
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let router =
        IntentRouter::new(remote, document.clone(), &client_config).with_status(status_tx);

    let session = CliChannel::new(router, document)
        .with_status(status_rx)
        .run(CliChannel::start())
        .await;

    tracing::info!(messages = session.len(), "Session ended");
    Ok(())
}
