//! Transfer options: method, redirect handling, limits and overrides.

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use url::Url;
use webfetch_client::{AbortSignal, AgentSelection, Connector, RedirectPolicy};

use crate::builder::core::FetchBuilder;

impl FetchBuilder {
    /// Sets the HTTP method.
    ///
    /// Switching to GET or HEAD does not clear a body that was already set;
    /// dispatch rejects that combination.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::{fetch, Method};
    ///
    /// let builder = fetch("https://example.com/items")
    ///     .method(Method::POST)
    ///     .body("payload");
    /// ```
    #[must_use]
    pub fn method(self, method: Method) -> Self {
        self.map(|request| *request.method_mut() = method)
    }

    /// Sets the redirect policy.
    ///
    /// [`RedirectPolicy::Follow`] chases redirects up to the hop budget,
    /// [`RedirectPolicy::Error`] rejects on the first redirect status and
    /// [`RedirectPolicy::Manual`] returns the redirect response untouched
    /// apart from an absolutized `Location` header.
    #[must_use]
    pub fn redirect(self, policy: RedirectPolicy) -> Self {
        self.map(|request| request.set_redirect(policy))
    }

    /// Sets the maximum number of redirect hops to follow.
    ///
    /// Zero forbids redirects entirely; the default budget is 20.
    #[must_use]
    pub fn follow(self, hops: u32) -> Self {
        self.map(|request| request.set_follow(hops))
    }

    /// Enables or disables transparent decompression.
    ///
    /// When enabled (the default), `Accept-Encoding: gzip, deflate, br` is
    /// offered and compressed response bodies are decoded before they reach
    /// the caller.
    #[must_use]
    pub fn compress(self, enabled: bool) -> Self {
        self.map(|request| request.set_compress(enabled))
    }

    /// Sets the request timeout.
    ///
    /// The duration bounds each hop up to response headers, and the same
    /// value bounds body consumption afterwards. [`Duration::ZERO`] disables
    /// the timeout.
    ///
    /// # Examples
    /// ```no_run
    /// use std::time::Duration;
    /// use webfetch::fetch;
    ///
    /// let builder = fetch("https://example.com/slow")
    ///     .timeout(Duration::from_secs(30));
    /// ```
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|request| request.set_timeout(timeout))
    }

    /// Caps the response body size in bytes. Zero means unlimited.
    #[must_use]
    pub fn size(self, limit: u64) -> Self {
        self.map(|request| request.set_size(limit))
    }

    /// Sets the read buffer hint applied when a body is cloned.
    #[must_use]
    pub fn high_water_mark(self, bytes: usize) -> Self {
        self.map(|request| request.set_high_water_mark(bytes))
    }

    /// Attaches an abort signal.
    ///
    /// A signal that fires before dispatch short-circuits the request; one
    /// that fires mid-flight terminates the transfer and fails any body
    /// consumption in progress.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::{fetch, AbortController};
    ///
    /// let controller = AbortController::new();
    /// let builder = fetch("https://example.com/feed")
    ///     .signal(controller.signal());
    /// // controller.abort() cancels the request from elsewhere.
    /// ```
    #[must_use]
    pub fn signal(self, signal: AbortSignal) -> Self {
        self.map(move |request| request.set_signal(Some(signal)))
    }

    /// Routes the request through a fixed connector instead of the default.
    #[must_use]
    pub fn agent(self, connector: Arc<dyn Connector>) -> Self {
        self.map(move |request| request.set_agent(AgentSelection::Fixed(connector)))
    }

    /// Picks a connector per target URL, falling back to the default when
    /// the selector returns `None`. The selector sees every redirect hop.
    #[must_use]
    pub fn agent_by_url<F>(self, select: F) -> Self
    where
        F: Fn(&Url) -> Option<Arc<dyn Connector>> + Send + Sync + 'static,
    {
        self.map(move |request| request.set_agent(AgentSelection::ByUrl(Arc::new(select))))
    }
}
