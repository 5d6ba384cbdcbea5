//! Fetch dispatcher.
//!
//! [`execute`] drives one fetch from validated request to terminal
//! response: default header synthesis per hop, the transport exchange
//! raced against the abort signal and request timeout, lenient header
//! ingestion, the redirect decision, and transparent content decoding.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use http::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use url::Url;

use crate::abort::AbortOnSignal;
use crate::connect::{ConnectRequest, Connector, HttpConnector, TransportResponse};
use crate::error;
use crate::http::body::{Body, BodySource, ByteStream};
use crate::http::decode::{decode_stream, should_decode};
use crate::http::headers::Headers;
use crate::http::request::{request_forbids_body, BodyForbidden, RedirectPolicy, Request};
use crate::http::response::Response;
use crate::redirect::{self, Step};

static USER_AGENT_VALUE: &str = concat!("webfetch/", env!("CARGO_PKG_VERSION"));

/// Runs a request to completion, following redirects per its policy.
///
/// 4xx and 5xx statuses resolve to an `Ok` response like any other; only
/// transport failures, aborts, limit violations and redirect policy
/// violations reject.
pub async fn execute(mut request: Request) -> crate::Result<Response> {
    if request.body().has_content() && request_forbids_body(request.method()) {
        return Err(error::builder(BodyForbidden(request.method().clone()))
            .with_url(request.url().clone()));
    }
    if let Some(signal) = request.signal() {
        if signal.is_aborted() {
            return Err(error::aborted().with_url(request.url().clone()));
        }
    }
    request.sync_body_context();

    loop {
        let url = request.url().clone();
        let transport = exchange_once(&mut request)
            .await
            .map_err(|e| attach_url(e, &url))?;

        let status = transport.status;
        let headers = Headers::from_raw_parts(transport.headers);

        tracing::debug!(
            target: "webfetch::client",
            status = status.as_u16(),
            url = %url,
            hops = request.counter(),
            "Received response"
        );

        match redirect::plan(&request, status, &headers) {
            Step::Reject(err) => return Err(err),
            Step::Hop { url: next, to_get } => {
                tracing::debug!(
                    target: "webfetch::client",
                    from = %url,
                    to = %next,
                    to_get,
                    "Following redirect"
                );
                redirect::apply_hop(&mut request, next, to_get);
            }
            Step::Finish => {
                return Ok(assemble_response(&request, status, headers, transport.body));
            }
        }
    }
}

/// One transport exchange, raced against the abort signal and the
/// request timeout.
async fn exchange_once(request: &mut Request) -> crate::Result<TransportResponse> {
    let url = request.url().clone();
    let mut headers = HeaderMap::from(request.headers().clone());
    synthesize_default_headers(&mut headers, request);

    let connect_request = ConnectRequest {
        url: url.clone(),
        method: request.method().clone(),
        headers,
        body: request.body_mut().wire_body(),
    };

    let connector: Arc<dyn Connector> = request
        .agent_for(&url)
        .unwrap_or_else(|| Arc::new(HttpConnector::new()));

    let signal = request.signal().cloned();
    let exchange = connector.dispatch(connect_request);
    let raced = async move {
        match signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => Err(error::aborted()),
                result = exchange => result,
            },
            None => exchange.await,
        }
    };

    if request.timeout() > Duration::ZERO {
        match tokio::time::timeout(request.timeout(), raced).await {
            Ok(result) => result,
            Err(_) => Err(error::request_timeout()),
        }
    } else {
        raced.await
    }
}

/// Builds the terminal response: manual-mode Location absolutization,
/// content decoding, abort wrapping and body limit propagation.
fn assemble_response(
    request: &Request,
    status: StatusCode,
    mut headers: Headers,
    raw: ByteStream,
) -> Response {
    if request.redirect() == RedirectPolicy::Manual && redirect::is_redirect(status.as_u16()) {
        redirect::absolutize_location(&mut headers, request.url());
    }

    let mut stream = raw;
    if should_decode(request.compress(), request.method(), status, &headers) {
        if let Some(encoding) = headers.get("content-encoding") {
            stream = decode_stream(&encoding, stream);
        }
    }
    if let Some(signal) = request.signal() {
        stream = AbortOnSignal::new(stream, signal.clone()).boxed();
    }

    let mut body = Body::from_source(BodySource::Stream(stream));
    body.set_size_limit(request.size());
    body.set_timeout(request.timeout());
    body.set_high_water_mark(request.high_water_mark());

    Response::fetched(
        request.url().clone(),
        status,
        headers,
        body,
        request.counter(),
    )
}

fn synthesize_default_headers(headers: &mut HeaderMap, request: &Request) {
    headers
        .entry(ACCEPT)
        .or_insert_with(|| HeaderValue::from_static("*/*"));
    headers
        .entry(USER_AGENT)
        .or_insert_with(|| HeaderValue::from_static(USER_AGENT_VALUE));
    if request.compress() {
        headers
            .entry(ACCEPT_ENCODING)
            .or_insert_with(|| HeaderValue::from_static("gzip, deflate, br"));
    }
    headers
        .entry(CONNECTION)
        .or_insert_with(|| HeaderValue::from_static("close"));

    if !headers.contains_key(CONTENT_TYPE) {
        if let Some(inferred) = request.body().inferred_content_type() {
            if let Ok(value) = HeaderValue::from_str(&inferred) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
    }

    if let Some(length) = outbound_content_length(request) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
}

/// Content-Length for the hop: fixed bodies advertise their exact length,
/// an empty body still advertises zero for methods that usually carry one,
/// and streams leave it unset so the transport uses chunked transfer.
fn outbound_content_length(request: &Request) -> Option<u64> {
    match request.body().len_hint() {
        Some(0) => {
            let method = request.method();
            if *method == Method::POST
                || *method == Method::PUT
                || *method == Method::PATCH
                || *method == Method::DELETE
            {
                Some(0)
            } else {
                None
            }
        }
        other => other,
    }
}

fn attach_url(err: crate::Error, url: &Url) -> crate::Error {
    if err.url().is_none() {
        err.with_url(url.clone())
    } else {
        err
    }
}
