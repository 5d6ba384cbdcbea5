//! Response body contract over a live server: single use, clones, limits,
//! timeouts, charset handling and typed errors.

mod support;

use std::time::Duration;

use axum::body::{Body as AxumBody, Bytes};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::StreamExt;
use webfetch::{fetch, Kind, StatusCode};

async fn drip() -> impl IntoResponse {
    let chunks = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
        b"part-1",
    ))])
    .chain(futures_util::stream::once(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Bytes::from_static(b"part-2"))
    }));
    AxumBody::from_stream(chunks)
}

async fn gbk_page() -> impl IntoResponse {
    // "你好" in GBK
    let mut page = Vec::new();
    page.extend_from_slice(b"<html><body>");
    page.extend_from_slice(&[0xC4, 0xE3, 0xBA, 0xC3]);
    page.extend_from_slice(b"</body></html>");
    ([(header::CONTENT_TYPE, "text/html; charset=gbk")], page)
}

fn app() -> Router {
    Router::new()
        .route("/text", get(|| async { "hello world" }))
        .route(
            "/json",
            get(|| async { Json(serde_json::json!({"name": "ada", "tries": 3})) }),
        )
        .route("/big", get(|| async { vec![b'x'; 64 * 1024] }))
        .route("/drip", get(drip))
        .route("/gbk", get(gbk_page))
}

#[tokio::test]
async fn bodies_are_single_use() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/text"))
        .send()
        .await
        .expect("request resolves");

    assert_eq!(response.text().await.expect("first read"), "hello world");
    assert!(response.is_body_used());

    let err = response.text().await.expect_err("second read must fail");
    assert_eq!(err.kind(), &Kind::BodyUsed);
    assert!(err.url().expect("url context").path().ends_with("/text"));
}

#[tokio::test]
async fn cloned_responses_read_independently() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/text"))
        .send()
        .await
        .expect("request resolves");
    let mut copy = response.try_clone().expect("unread response clones");

    assert_eq!(response.text().await.expect("original"), "hello world");
    assert_eq!(copy.text().await.expect("copy"), "hello world");
}

#[tokio::test]
async fn json_deserializes_into_typed_values() {
    #[derive(serde::Deserialize)]
    struct Payload {
        name: String,
        tries: u32,
    }

    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/json"))
        .send()
        .await
        .expect("request resolves");
    let payload: Payload = response.json().await.expect("valid json");

    assert_eq!(payload.name, "ada");
    assert_eq!(payload.tries, 3);
}

#[tokio::test]
async fn json_on_plain_text_reports_a_decode_error() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/text"))
        .send()
        .await
        .expect("request resolves");
    let err = response
        .json::<serde_json::Value>()
        .await
        .expect_err("plain text is not json");

    assert_eq!(err.kind(), &Kind::Decode);
}

#[tokio::test]
async fn size_cap_rejects_oversized_bodies() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/big"))
        .size(1024)
        .send()
        .await
        .expect("headers resolve before the cap applies");
    assert_eq!(response.status(), StatusCode::OK);

    let err = response.bytes().await.expect_err("64 KiB over a 1 KiB cap");
    assert_eq!(err.kind(), &Kind::MaxSize);
    assert!(err.is_max_size());
}

#[tokio::test]
async fn stalled_bodies_hit_the_body_timeout() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/drip"))
        .timeout(Duration::from_millis(250))
        .send()
        .await
        .expect("headers arrive before the stall");

    let err = response.text().await.expect_err("body stalls past timeout");
    assert_eq!(err.kind(), &Kind::BodyTimeout);
    assert!(err.is_timeout());
}

#[tokio::test]
async fn charset_hints_decode_non_utf8_pages() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/gbk"))
        .send()
        .await
        .expect("request resolves");
    let text = response.text().await.expect("decodes via charset hint");

    assert!(text.contains("你好"), "got {text}");
}

#[tokio::test]
async fn raw_stream_handoff_yields_the_payload() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/text"))
        .send()
        .await
        .expect("request resolves");

    let mut stream = response.stream().expect("handoff");
    assert!(response.is_body_used());

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.expect("chunk is ok"));
    }
    assert_eq!(collected, b"hello world");
}

#[tokio::test]
async fn blob_is_typed_by_the_response_content_type() {
    let base = support::serve(app()).await;

    let mut response = fetch(format!("{base}/json"))
        .send()
        .await
        .expect("request resolves");
    let blob = response.blob().await.expect("collects");

    assert_eq!(blob.content_type(), "application/json");
    assert!(blob.size() > 0);
}

#[tokio::test]
async fn http_error_statuses_still_resolve_ok() {
    let app = Router::new().route(
        "/missing",
        get(|| async { (StatusCode::NOT_FOUND, "nothing here") }),
    );
    let base = support::serve(app).await;

    let mut response = fetch(format!("{base}/missing"))
        .send()
        .await
        .expect("4xx is a response, not an error");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.ok());
    assert_eq!(response.status_text(), "Not Found");
    assert_eq!(response.text().await.expect("body"), "nothing here");
}
