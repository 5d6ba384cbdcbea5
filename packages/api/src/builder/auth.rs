//! Authentication header helpers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::builder::core::FetchBuilder;

impl FetchBuilder {
    /// Sets a `Bearer` token `Authorization` header.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::fetch;
    ///
    /// let builder = fetch("https://example.com/protected")
    ///     .bearer_auth("oauth-token");
    /// ```
    #[must_use]
    pub fn bearer_auth(self, token: &str) -> Self {
        let value = format!("Bearer {token}");
        self.try_map(move |request| request.headers_mut().set("authorization", &value))
    }

    /// Sets a `Basic` `Authorization` header from credentials.
    ///
    /// The pair is base64 encoded as `user:password`; a missing password
    /// encodes as `user:`.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::fetch;
    ///
    /// let builder = fetch("https://example.com/protected")
    ///     .basic_auth("admin", Some("hunter2"));
    /// ```
    #[must_use]
    pub fn basic_auth(self, username: &str, password: Option<&str>) -> Self {
        let credentials = match password {
            Some(password) => format!("{username}:{password}"),
            None => format!("{username}:"),
        };
        let value = format!("Basic {}", STANDARD.encode(credentials));
        self.try_map(move |request| request.headers_mut().set("authorization", &value))
    }
}
