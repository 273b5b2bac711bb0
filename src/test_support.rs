//! Helpers shared by unit tests.

use std::time::Duration;

use tokio::net::TcpListener;

/// Serve `app` on a random local port and return its base URL.
pub(crate) async fn spawn_stub(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(20)).await;

    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub(crate) async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
