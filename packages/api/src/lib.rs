//! Browser-style `fetch` for Rust programs.
//!
//! The entry point is [`fetch`]: give it a URL, chain options, await the
//! response. Redirects are followed transparently, compressed bodies are
//! decoded before delivery and HTTP error statuses resolve `Ok` so callers
//! can inspect them.
//!
//! ```no_run
//! use webfetch::fetch;
//!
//! # async fn run() -> webfetch::Result<()> {
//! let mut response = fetch("https://example.com/todos/1")
//!     .header("accept", "application/json")
//!     .send()
//!     .await?;
//!
//! assert!(response.ok());
//! let body = response.text().await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```
//!
//! Response bodies are single-use streams. Consuming one with
//! [`Response::text`], [`Response::bytes`], [`Response::json`] or
//! [`Response::stream`] marks it used; call [`Response::try_clone`] first
//! when two readers need the payload.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::FetchBuilder;

pub use webfetch_client::{
    execute, is_redirect, AbortController, AbortSignal, AgentSelection, Blob, Body, ByteStream,
    ConnectRequest, Connector, Error, HeaderError, Headers, HttpConnector, IntoUrl, Kind,
    RedirectPolicy, Request, Response, ResponseType, Result, TransportResponse, WireBody,
};

pub use bytes::Bytes;
pub use http::{Method, StatusCode, Version};
pub use url::Url;

/// Starts a fetch for `url` and returns the builder to configure it.
///
/// The request defaults to GET with an empty body; chain calls to change
/// the method, attach headers or a body, and adjust redirect, size, timeout
/// and abort behavior. Nothing touches the network until
/// [`send`](FetchBuilder::send) is awaited.
///
/// # Examples
/// ```no_run
/// use webfetch::{fetch, Method, RedirectPolicy};
///
/// # async fn run() -> webfetch::Result<()> {
/// let response = fetch("https://example.com/submit")
///     .method(Method::POST)
///     .body("payload")
///     .redirect(RedirectPolicy::Follow)
///     .send()
///     .await?;
/// # let _ = response;
/// # Ok(())
/// # }
/// ```
pub fn fetch(url: impl IntoUrl) -> FetchBuilder {
    FetchBuilder::new(url)
}

/// Dispatches an already constructed [`Request`].
///
/// Equivalent to `FetchBuilder::from_request(request).send()`.
///
/// # Errors
/// Rejects for the same reasons as [`FetchBuilder::send`]: transport
/// failures, redirect policy violations, limits, aborts and timeouts.
pub async fn fetch_with(request: Request) -> Result<Response> {
    FetchBuilder::from_request(request).send().await
}
