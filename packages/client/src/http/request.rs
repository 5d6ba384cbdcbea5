//! Outbound request model.
//!
//! A [`Request`] bundles a validated URL, method, headers and a single-use
//! [`Body`] together with the transfer options the dispatcher consults:
//! redirect policy and hop budget, compression opt-out, abort signal, size
//! cap, timeout and connector override.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use url::Url;

use super::body::{Body, DEFAULT_HIGH_WATER_MARK};
use super::headers::Headers;
use super::into_url::IntoUrl;
use crate::abort::AbortSignal;
use crate::connect::Connector;
use crate::error;

/// Default redirect hop budget.
pub(crate) const DEFAULT_FOLLOW: u32 = 20;

/// How the dispatcher treats 3xx responses carrying `Location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Follow up to the request's hop budget.
    #[default]
    Follow,
    /// Surface a typed error on the first redirect.
    Error,
    /// Return the redirect response itself, untouched.
    Manual,
}

impl RedirectPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectPolicy::Follow => "follow",
            RedirectPolicy::Error => "error",
            RedirectPolicy::Manual => "manual",
        }
    }
}

/// Connector override carried by a request.
#[derive(Clone, Default)]
pub enum AgentSelection {
    /// Use the built-in TCP/TLS connector.
    #[default]
    Default,
    /// Route every hop through one connector.
    Fixed(Arc<dyn Connector>),
    /// Pick a connector per URL; `None` falls back to the built-in one.
    ByUrl(Arc<dyn Fn(&Url) -> Option<Arc<dyn Connector>> + Send + Sync>),
}

impl fmt::Debug for AgentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSelection::Default => f.write_str("AgentSelection::Default"),
            AgentSelection::Fixed(_) => f.write_str("AgentSelection::Fixed(..)"),
            AgentSelection::ByUrl(_) => f.write_str("AgentSelection::ByUrl(..)"),
        }
    }
}

/// An outbound HTTP request.
#[derive(Debug)]
pub struct Request {
    url: Url,
    method: Method,
    headers: Headers,
    body: Body,
    redirect: RedirectPolicy,
    follow: u32,
    counter: u32,
    compress: bool,
    signal: Option<AbortSignal>,
    size: u64,
    timeout: Duration,
    agent: AgentSelection,
    high_water_mark: usize,
}

impl Request {
    /// Builds a request for `url`, validating that the URL is absolute,
    /// uses http or https and names a host.
    pub fn new(method: Method, url: impl IntoUrl) -> crate::Result<Request> {
        Ok(Request {
            url: url.into_url()?,
            method,
            headers: Headers::new(),
            body: Body::empty(),
            redirect: RedirectPolicy::default(),
            follow: DEFAULT_FOLLOW,
            counter: 0,
            compress: true,
            signal: None,
            size: 0,
            timeout: Duration::ZERO,
            agent: AgentSelection::Default,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        })
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl IntoUrl) -> crate::Result<Request> {
        Request::new(Method::GET, url)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
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

    /// Attaches a body. GET and HEAD requests reject non-empty bodies.
    pub fn set_body(&mut self, body: impl Into<Body>) -> crate::Result<()> {
        let body = body.into();
        if body.has_content() && request_forbids_body(&self.method) {
            return Err(error::builder(BodyForbidden(self.method.clone()))
                .with_url(self.url.clone()));
        }
        self.body = body;
        Ok(())
    }

    #[must_use]
    pub fn redirect(&self) -> RedirectPolicy {
        self.redirect
    }

    pub fn set_redirect(&mut self, policy: RedirectPolicy) {
        self.redirect = policy;
    }

    /// Redirect hop budget for the `Follow` policy.
    #[must_use]
    pub fn follow(&self) -> u32 {
        self.follow
    }

    pub fn set_follow(&mut self, follow: u32) {
        self.follow = follow;
    }

    /// Redirect hops already taken to produce this request.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub(crate) fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    /// Whether to advertise and transparently decode compressed encodings.
    #[must_use]
    pub fn compress(&self) -> bool {
        self.compress
    }

    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    #[must_use]
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    pub fn set_signal(&mut self, signal: Option<AbortSignal>) {
        self.signal = signal;
    }

    /// Response size cap in bytes. Zero disables the cap.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Overall request deadline. Zero disables it.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    #[must_use]
    pub fn agent(&self) -> &AgentSelection {
        &self.agent
    }

    pub fn set_agent(&mut self, agent: AgentSelection) {
        self.agent = agent;
    }

    /// Buffering hint applied when the response body is teed by `clone`.
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn set_high_water_mark(&mut self, high_water_mark: usize) {
        self.high_water_mark = high_water_mark;
    }

    /// Drops the body, bypassing method checks. Used by the redirect
    /// rewrite that turns a hop into a bare GET.
    pub(crate) fn clear_body(&mut self) {
        self.body = Body::empty();
    }

    /// Resolves the connector override for one hop, if any.
    pub(crate) fn agent_for(&self, url: &Url) -> Option<Arc<dyn Connector>> {
        match &self.agent {
            AgentSelection::Default => None,
            AgentSelection::Fixed(connector) => Some(Arc::clone(connector)),
            AgentSelection::ByUrl(select) => select(url),
        }
    }

    /// Copies URL, limits and `Content-Type` context onto the body so
    /// consumption and error reporting see the owner's settings.
    pub(crate) fn sync_body_context(&mut self) {
        let content_type = self.headers.get("content-type");
        self.body.set_url(self.url.clone());
        self.body.set_content_type_hint(content_type);
        self.body.set_size_limit(self.size);
        self.body.set_timeout(self.timeout);
        self.body.set_high_water_mark(self.high_water_mark);
    }

    /// Clones the request, splitting an unconsumed stream body in two.
    /// Fails if the body was already used.
    pub fn try_clone(&mut self) -> crate::Result<Request> {
        self.body.set_high_water_mark(self.high_water_mark);
        let body = self
            .body
            .try_clone()
            .map_err(|e| e.with_url(self.url.clone()))?;
        Ok(Request {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body,
            redirect: self.redirect,
            follow: self.follow,
            counter: self.counter,
            compress: self.compress,
            signal: self.signal.clone(),
            size: self.size,
            timeout: self.timeout,
            agent: self.agent.clone(),
            high_water_mark: self.high_water_mark,
        })
    }
}

/// True for methods whose requests must not carry a payload.
pub(crate) fn request_forbids_body(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

#[derive(Debug)]
pub(crate) struct BodyForbidden(pub(crate) Method);

impl fmt::Display for BodyForbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request with {} method cannot have body", self.0)
    }
}

impl std::error::Error for BodyForbidden {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_validates_the_url() {
        assert!(Request::get("http://example.com/a").is_ok());
        assert!(Request::get("https://example.com/a").is_ok());

        let err = Request::get("ftp://example.com/a").expect_err("scheme");
        assert!(err.is_builder());

        let err = Request::get("http:///no-host").expect_err("host");
        assert!(err.is_builder());
    }

    #[test]
    fn get_and_head_reject_bodies() {
        let mut req = Request::get("http://example.com/").expect("valid URL");
        let err = req.set_body("payload").expect_err("GET cannot carry one");
        assert!(err.is_builder());

        let mut req =
            Request::new(Method::HEAD, "http://example.com/").expect("valid URL");
        assert!(req.set_body("payload").is_err());

        // An explicitly empty body is fine.
        assert!(req.set_body(Body::empty()).is_ok());

        let mut req =
            Request::new(Method::POST, "http://example.com/").expect("valid URL");
        assert!(req.set_body("payload").is_ok());
    }

    #[test]
    fn defaults_match_the_fetch_contract() {
        let req = Request::get("http://example.com/").expect("valid URL");
        assert_eq!(req.redirect(), RedirectPolicy::Follow);
        assert_eq!(req.follow(), 20);
        assert_eq!(req.counter(), 0);
        assert!(req.compress());
        assert_eq!(req.size(), 0);
        assert_eq!(req.timeout(), Duration::ZERO);
        assert!(req.signal().is_none());
        assert!(matches!(req.agent(), AgentSelection::Default));
    }

    #[tokio::test]
    async fn clone_splits_the_body() {
        let mut req = Request::new(Method::POST, "http://example.com/").expect("valid URL");
        req.set_body("hello").expect("POST accepts a body");
        let mut copy = req.try_clone().expect("unused body clones");

        assert_eq!(req.body_mut().text().await.expect("original"), "hello");
        assert_eq!(copy.body_mut().text().await.expect("copy"), "hello");
    }

    #[tokio::test]
    async fn clone_after_body_use_fails_with_url() {
        let mut req = Request::new(Method::POST, "http://example.com/doc").expect("valid URL");
        req.set_body("hello").expect("POST accepts a body");
        req.sync_body_context();
        let _ = req.body_mut().bytes().await;

        let err = req.try_clone().expect_err("used body cannot clone");
        assert!(err.is_body_used());
        assert!(err.url().is_some());
    }
}
