//! Fetch-style HTTP client internals.
//!
//! This crate is the engine behind the `webfetch` API crate: the
//! request/response data model, the redirect-following dispatcher,
//! transparent content decoding and the pluggable transport seam.
//!
//! The behavioral contract follows the browser fetch surface where it
//! translates to Rust:
//!
//! - **Single-use bodies.** [`Body`] streams lazily and can be consumed
//!   exactly once; [`Request::try_clone`]/[`Response::try_clone`] split an
//!   unconsumed stream into two independent branches.
//! - **Lenient response headers.** Wire pairs a strict [`Headers`] would
//!   reject are dropped with a warning, never a failed fetch.
//! - **HTTP errors are responses.** A 404 or 500 resolves `Ok`; only
//!   transport failures, aborts, limits and redirect policy violations
//!   reject, each with a stable [`Kind`] tag.
//! - **Transparent decoding.** `gzip`, `deflate` (zlib-wrapped or raw) and
//!   `br` response encodings are decoded in-stream unless compression is
//!   disabled.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod abort;
pub mod client;
pub mod connect;
pub mod error;
pub mod http;
pub mod redirect;

pub use crate::abort::{AbortController, AbortSignal};
pub use crate::client::execute;
pub use crate::connect::{ConnectRequest, Connector, HttpConnector, TransportResponse, WireBody};
pub use crate::error::{Error, Kind, Result};
pub use crate::http::{
    AgentSelection, Blob, Body, ByteStream, HeaderError, Headers, IntoUrl, RedirectPolicy,
    Request, Response, ResponseType,
};
pub use crate::redirect::is_redirect;
