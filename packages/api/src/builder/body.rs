//! Request body attachment and serialization.

use serde::Serialize;
use webfetch_client::{error, Body};

use crate::builder::core::FetchBuilder;

impl FetchBuilder {
    /// Attaches a request body.
    ///
    /// Accepts anything convertible into [`Body`]: strings, byte buffers,
    /// blobs or wrapped streams. Text bodies are sent as
    /// `text/plain;charset=UTF-8` unless a `Content-Type` header is set.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::{fetch, Method};
    ///
    /// let builder = fetch("https://example.com/notes")
    ///     .method(Method::POST)
    ///     .body("a=1");
    /// ```
    #[must_use]
    pub fn body(self, body: impl Into<Body>) -> Self {
        let body = body.into();
        self.try_map(move |request| request.set_body(body))
    }

    /// Serializes `value` as JSON and attaches it as the body.
    ///
    /// Sets `Content-Type: application/json` unless one is already present.
    /// Serialization failures are deferred like any construction error.
    ///
    /// # Examples
    /// ```no_run
    /// use serde::Serialize;
    /// use webfetch::{fetch, Method};
    ///
    /// #[derive(Serialize)]
    /// struct NewUser<'a> {
    ///     name: &'a str,
    /// }
    ///
    /// let builder = fetch("https://example.com/users")
    ///     .method(Method::POST)
    ///     .json(&NewUser { name: "ada" });
    /// ```
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        let serialized = serde_json::to_string(value);
        self.try_map(move |request| {
            let text = serialized.map_err(error::builder)?;
            if !request.headers().has("content-type") {
                request.headers_mut().set("content-type", "application/json")?;
            }
            request.set_body(text)
        })
    }

    /// Serializes `value` as `application/x-www-form-urlencoded` and
    /// attaches it as the body, setting the content type unless present.
    #[must_use]
    pub fn form<T: Serialize + ?Sized>(self, value: &T) -> Self {
        let serialized = serde_urlencoded::to_string(value);
        self.try_map(move |request| {
            let text = serialized.map_err(error::builder)?;
            if !request.headers().has("content-type") {
                request
                    .headers_mut()
                    .set("content-type", "application/x-www-form-urlencoded")?;
            }
            request.set_body(text)
        })
    }
}
