//! Transport seam between the dispatcher and the network.
//!
//! A [`Connector`] performs one HTTP exchange per call: it receives the
//! wire-level request for a single hop and returns the raw status line,
//! header pairs and body stream. [`HttpConnector`] is the built-in
//! implementation (fresh TCP plus TLS per request, HTTP/1.1); a request's
//! agent option swaps in any other implementation, which is how tests and
//! embedders intercept traffic.

pub(crate) mod http;

pub use self::http::HttpConnector;

use std::fmt;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use url::Url;

use ::http::{HeaderMap, Method, StatusCode, Version};

use crate::http::body::ByteStream;

/// Wire shape of an outbound body for one hop.
pub enum WireBody {
    /// No payload.
    Empty,
    /// A fully buffered payload with known length.
    Full(Bytes),
    /// A live chunk stream with unknown total length.
    Streaming(ByteStream),
}

impl fmt::Debug for WireBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireBody::Empty => f.write_str("Empty"),
            WireBody::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            WireBody::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Everything a connector needs to perform one hop.
pub struct ConnectRequest {
    pub url: Url,
    pub method: Method,
    /// Validated headers, including the synthesized defaults.
    pub headers: HeaderMap,
    pub body: WireBody,
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw response handed back by a connector, before header ingestion and
/// content decoding.
pub struct TransportResponse {
    pub status: StatusCode,
    pub version: Version,
    /// Raw name/value pairs. Ingestion is lenient: pairs a strict `Headers`
    /// would reject are dropped with a warning instead of failing the fetch.
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: ByteStream,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("headers", &self.headers.len())
            .finish()
    }
}

/// Connection provider: one call performs one HTTP exchange.
pub trait Connector: Send + Sync {
    fn dispatch(&self, request: ConnectRequest) -> BoxFuture<'static, crate::Result<TransportResponse>>;
}
