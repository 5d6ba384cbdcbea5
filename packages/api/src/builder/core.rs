//! Core `FetchBuilder` type: construction, build and dispatch.

use webfetch_client::{execute, IntoUrl, Request, Response};

/// Fluent builder for a fetch request.
///
/// Created by [`fetch`](crate::fetch). Every chained call either records an
/// option or records the first error encountered; the error surfaces when
/// the request is built or sent, so chains never panic mid-way.
///
/// # Examples
/// ```no_run
/// use webfetch::fetch;
///
/// # async fn run() -> webfetch::Result<()> {
/// let response = fetch("https://example.com/data")
///     .header("accept", "application/json")
///     .send()
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FetchBuilder {
    pub(crate) request: webfetch_client::Result<Request>,
}

impl FetchBuilder {
    /// Starts a builder for a GET request to `url`.
    ///
    /// An invalid URL does not fail here; it is reported by
    /// [`send`](Self::send) or [`build`](Self::build).
    pub fn new(url: impl IntoUrl) -> FetchBuilder {
        FetchBuilder {
            request: Request::get(url),
        }
    }

    /// Wraps an already constructed [`Request`] for further modification.
    #[must_use]
    pub fn from_request(request: Request) -> FetchBuilder {
        FetchBuilder {
            request: Ok(request),
        }
    }

    /// Applies a fallible mutation, deferring any error to dispatch time.
    pub(crate) fn try_map<F>(self, apply: F) -> FetchBuilder
    where
        F: FnOnce(&mut Request) -> webfetch_client::Result<()>,
    {
        FetchBuilder {
            request: self.request.and_then(|mut request| {
                apply(&mut request)?;
                Ok(request)
            }),
        }
    }

    /// Applies an infallible mutation.
    pub(crate) fn map<F>(self, apply: F) -> FetchBuilder
    where
        F: FnOnce(&mut Request),
    {
        self.try_map(|request| {
            apply(request);
            Ok(())
        })
    }

    /// Finishes building and returns the request without dispatching it.
    ///
    /// # Errors
    /// Returns the first construction error recorded by the chain.
    pub fn build(self) -> webfetch_client::Result<Request> {
        self.request
    }

    /// Dispatches the request and resolves with the terminal response.
    ///
    /// HTTP error statuses (4xx/5xx) resolve `Ok`; only construction,
    /// transport, policy and limit failures reject.
    ///
    /// # Errors
    /// Returns construction errors recorded by the chain, or any error
    /// produced while connecting, following redirects or reading headers.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::fetch;
    ///
    /// # async fn run() -> webfetch::Result<()> {
    /// let mut response = fetch("https://example.com").send().await?;
    /// let page = response.text().await?;
    /// # let _ = page;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(self) -> webfetch_client::Result<Response> {
        let request = self.request?;
        tracing::debug!(
            target: "webfetch::api",
            method = %request.method(),
            url = %request.url(),
            "Dispatching request"
        );
        execute(request).await
    }
}
