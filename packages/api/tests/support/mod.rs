//! Shared plumbing for integration tests: an ephemeral axum server.

use axum::Router;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral local port and returns the base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}
