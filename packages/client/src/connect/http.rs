//! Built-in connector: fresh TCP (plus TLS) per request, HTTP/1.1.
//!
//! Connection reuse is out of scope; every dispatch opens its own socket,
//! runs one exchange and lets the connection wind down when the body
//! stream finishes.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, BodyStream, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::Url;

use super::{ConnectRequest, Connector, TransportResponse, WireBody};
use crate::error;
use crate::error::BoxError;
use crate::http::body::ByteStream;

use ::http::header::HOST;
use ::http::HeaderValue;

static TLS_CONFIG: Lazy<Arc<ClientConfig>> = Lazy::new(|| {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
});

/// The default TCP/TLS connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl HttpConnector {
    #[must_use]
    pub fn new() -> HttpConnector {
        HttpConnector
    }
}

impl Connector for HttpConnector {
    fn dispatch(&self, request: ConnectRequest) -> BoxFuture<'static, crate::Result<TransportResponse>> {
        Box::pin(exchange(request))
    }
}

async fn exchange(request: ConnectRequest) -> crate::Result<TransportResponse> {
    let url = request.url.clone();
    let host = match url.host_str() {
        Some(host) => host.to_owned(),
        None => return Err(error::url_missing_host(url)),
    };
    // Bracketed IPv6 literals must be unbracketed for lookup and TLS.
    let lookup_host = host.trim_start_matches('[').trim_end_matches(']').to_owned();
    let port = url.port_or_known_default().unwrap_or(80);

    tracing::debug!(
        target: "webfetch::connect",
        host = %host,
        port,
        scheme = url.scheme(),
        "Opening connection"
    );

    let stream = TcpStream::connect((lookup_host.as_str(), port))
        .await
        .map_err(error::system)?;

    if url.scheme() == "https" {
        let server_name =
            ServerName::try_from(lookup_host.clone()).map_err(error::system)?;
        let connector = TlsConnector::from(Arc::clone(&TLS_CONFIG));
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(error::system)?;
        run_http1(TokioIo::new(tls), request).await
    } else {
        run_http1(TokioIo::new(stream), request).await
    }
}

async fn run_http1<I>(io: TokioIo<I>, request: ConnectRequest) -> crate::Result<TransportResponse>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(error::system)?;

    // The connection task pumps bytes for the in-flight exchange and ends
    // when the response body has been fully read or either side drops.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(target: "webfetch::connect", error = %e, "Connection ended with error");
        }
    });

    let wire = hyper::Request::builder()
        .method(request.method.clone())
        .uri(origin_form(&request.url));
    let mut wire = wire.body(outbound_body(request.body)).map_err(error::builder)?;
    *wire.headers_mut() = request.headers;
    if !wire.headers().contains_key(HOST) {
        let authority = host_header_value(&request.url)?;
        wire.headers_mut().insert(HOST, authority);
    }

    let response = sender.send_request(wire).await.map_err(error::system)?;
    let (parts, incoming) = response.into_parts();

    let headers: Vec<(String, Vec<u8>)> = parts
        .headers
        .iter()
        .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
        .collect();

    let body: ByteStream = BodyStream::new(incoming)
        .filter_map(|item| {
            std::future::ready(match item {
                Ok(frame) => frame.into_data().ok().map(Ok),
                Err(e) => Some(Err(error::system(e))),
            })
        })
        .boxed();

    Ok(TransportResponse {
        status: parts.status,
        version: parts.version,
        headers,
        body,
    })
}

// The stream variant is `Send` but not `Sync`, hence the unsync boxing.
fn outbound_body(body: WireBody) -> UnsyncBoxBody<Bytes, BoxError> {
    match body {
        WireBody::Empty => Empty::<Bytes>::new()
            .map_err(|never| match never {})
            .boxed_unsync(),
        WireBody::Full(bytes) => Full::new(bytes)
            .map_err(|never| match never {})
            .boxed_unsync(),
        WireBody::Streaming(stream) => {
            let frames =
                stream.map(|item| item.map(Frame::data).map_err(|e| Box::new(e) as BoxError));
            StreamBody::new(frames).boxed_unsync()
        }
    }
}

/// Request target in origin form: path plus optional query.
fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_owned(),
    }
}

/// `Host` header value: hostname plus the port when not scheme-default.
fn host_header_value(url: &Url) -> crate::Result<HeaderValue> {
    let host = url.host_str().unwrap_or_default();
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    HeaderValue::from_str(&authority).map_err(error::builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_keeps_path_and_query() {
        let url = Url::parse("http://a.test/dir/page?x=1&y=2").expect("static URL parses");
        assert_eq!(origin_form(&url), "/dir/page?x=1&y=2");

        let url = Url::parse("http://a.test").expect("static URL parses");
        assert_eq!(origin_form(&url), "/");
    }

    #[test]
    fn host_header_includes_nondefault_ports_only() {
        let url = Url::parse("http://a.test/").expect("static URL parses");
        assert_eq!(host_header_value(&url).expect("valid"), "a.test");

        let url = Url::parse("http://a.test:8080/").expect("static URL parses");
        assert_eq!(host_header_value(&url).expect("valid"), "a.test:8080");

        let url = Url::parse("https://a.test:443/").expect("static URL parses");
        assert_eq!(host_header_value(&url).expect("valid"), "a.test");
    }

    #[test]
    fn ipv6_hosts_keep_brackets_in_the_host_header() {
        let url = Url::parse("http://[::1]:3000/x").expect("static URL parses");
        assert_eq!(host_header_value(&url).expect("valid"), "[::1]:3000");
    }
}
