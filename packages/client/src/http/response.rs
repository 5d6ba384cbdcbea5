//! Inbound response model.
//!
//! A [`Response`] pairs the status line and headers with a single-use
//! [`Body`]. `ok` and `redirected` are computed, never stored: `ok` is the
//! 2xx test and `redirected` reports whether any redirect hop produced this
//! response. Synthetic responses for handler-style code come from
//! [`Response::new`], [`Response::error`], [`Response::redirect_to`] and
//! [`Response::json_body`].

use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::body::{Blob, Body, ByteStream};
use super::headers::Headers;
use super::into_url::IntoUrl;
use crate::error;
use crate::redirect::is_redirect;

/// Provenance tag distinguishing real responses from the failure sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Default,
    /// Built by [`Response::error`]; never produced by a fetch.
    Error,
}

/// An HTTP response with a single-use body.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Body,
    url: Option<Url>,
    counter: u32,
    response_type: ResponseType,
}

impl Response {
    /// A synthetic 200 response around `body`.
    pub fn new(body: impl Into<Body>) -> Response {
        Response {
            status: StatusCode::OK,
            headers: Headers::new(),
            body: body.into(),
            url: None,
            counter: 0,
            response_type: ResponseType::Default,
        }
    }

    /// A synthetic response with an explicit status code. `status` must lie
    /// in the constructible range [200, 599], and 204 admits no body.
    pub fn with_status(status: u16, body: impl Into<Body>) -> crate::Result<Response> {
        if !(200..=599).contains(&status) {
            return Err(error::builder(StatusOutOfRange(status)));
        }
        let status = StatusCode::from_u16(status).map_err(error::builder)?;
        let body = body.into();
        if status == StatusCode::NO_CONTENT && body.has_content() {
            return Err(error::builder(BodyOnNoContentStatus(status.as_u16())));
        }
        let mut response = Response::new(body);
        response.status = status;
        Ok(response)
    }

    /// The failed-fetch sentinel: type `Error`, status 400, empty body.
    #[must_use]
    pub fn error() -> Response {
        let mut response = Response::new(Body::empty());
        response.status = StatusCode::BAD_REQUEST;
        response.response_type = ResponseType::Error;
        response
    }

    /// A redirect-only response pointing at `url`. `status` must be one of
    /// the Location-bearing codes (301, 302, 303, 307, 308).
    pub fn redirect_to(url: impl IntoUrl, status: u16) -> crate::Result<Response> {
        let url = url.into_url()?;
        if !is_redirect(status) {
            return Err(error::builder(NotARedirectStatus(status)).with_url(url));
        }
        let mut response = Response::with_status(status, Body::empty())?;
        response
            .headers
            .set("location", url.as_str())
            .map_err(|e| e.with_url(url))?;
        Ok(response)
    }

    /// A 200 response whose body is `value` serialized as JSON, with
    /// `Content-Type: application/json`.
    pub fn json_body<T: Serialize>(value: &T) -> crate::Result<Response> {
        let text = serde_json::to_string(value).map_err(error::builder)?;
        let mut response = Response::new(text);
        response
            .headers
            .set("content-type", "application/json")?;
        Ok(response)
    }

    /// Assembles a fetched response. The body arrives with limits already
    /// applied; URL and `Content-Type` context are synced here.
    pub(crate) fn fetched(
        url: Url,
        status: StatusCode,
        headers: Headers,
        mut body: Body,
        counter: u32,
    ) -> Response {
        body.set_url(url.clone());
        let mut response = Response {
            status,
            headers,
            body,
            url: Some(url),
            counter,
            response_type: ResponseType::Default,
        };
        response.sync_content_type();
        response
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Canonical reason phrase for the status, or empty when nonstandard.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// True when at least one redirect hop produced this response.
    #[must_use]
    pub fn redirected(&self) -> bool {
        self.counter > 0
    }

    /// Final URL after redirects. `None` on synthetic responses.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// True once the body has been consumed.
    #[must_use]
    pub fn is_body_used(&self) -> bool {
        self.body.is_used()
    }

    /// Collects the body into one buffer. Consumes the single use.
    pub async fn bytes(&mut self) -> crate::Result<Bytes> {
        self.sync_content_type();
        self.body.bytes().await
    }

    /// Decodes the body as text, sniffing the charset for textual media
    /// types per the current `Content-Type` header.
    pub async fn text(&mut self) -> crate::Result<String> {
        self.sync_content_type();
        self.body.text().await
    }

    /// Parses the body as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        self.sync_content_type();
        self.body.json().await
    }

    /// Collects the body into a [`Blob`] typed by `Content-Type`.
    pub async fn blob(&mut self) -> crate::Result<Blob> {
        self.sync_content_type();
        self.body.blob().await
    }

    /// Takes the body as a raw chunk stream.
    pub fn stream(&mut self) -> crate::Result<ByteStream> {
        self.body.stream()
    }

    /// Clones the response, splitting an unconsumed stream body in two.
    /// Fails if the body was already used.
    pub fn try_clone(&mut self) -> crate::Result<Response> {
        let body = self.body.try_clone()?;
        Ok(Response {
            status: self.status,
            headers: self.headers.clone(),
            body,
            url: self.url.clone(),
            counter: self.counter,
            response_type: self.response_type,
        })
    }

    /// Re-reads the `Content-Type` header so charset sniffing and blob
    /// typing see header mutations made after construction.
    fn sync_content_type(&mut self) {
        self.body
            .set_content_type_hint(self.headers.get("content-type"));
    }
}

#[derive(Debug)]
struct NotARedirectStatus(u16);

impl fmt::Display for NotARedirectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} is not a redirect status", self.0)
    }
}

impl std::error::Error for NotARedirectStatus {}

#[derive(Debug)]
struct StatusOutOfRange(u16);

impl fmt::Display for StatusOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} is outside the constructible range 200-599", self.0)
    }
}

impl std::error::Error for StatusOutOfRange {}

#[derive(Debug)]
struct BodyOnNoContentStatus(u16);

impl fmt::Display for BodyOnNoContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} does not allow a response body", self.0)
    }
}

impl std::error::Error for BodyOnNoContentStatus {}
