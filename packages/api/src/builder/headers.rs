//! Header manipulation on the builder chain.

use crate::builder::core::FetchBuilder;

impl FetchBuilder {
    /// Sets a header, replacing every existing value under that name.
    ///
    /// Names are case-insensitive. An invalid name or value is recorded and
    /// reported at dispatch time.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::fetch;
    ///
    /// let builder = fetch("https://example.com/api")
    ///     .header("accept", "application/json")
    ///     .header("x-request-id", "abc-123");
    /// ```
    #[must_use]
    pub fn header(self, name: &str, value: &str) -> Self {
        let name = name.to_string();
        let value = value.to_string();
        self.try_map(move |request| request.headers_mut().set(&name, &value))
    }

    /// Adds a header value without displacing existing ones under the name.
    #[must_use]
    pub fn append_header(self, name: &str, value: &str) -> Self {
        let name = name.to_string();
        let value = value.to_string();
        self.try_map(move |request| request.headers_mut().append(&name, &value))
    }

    /// Sets several headers at once; each pair replaces prior values.
    ///
    /// # Examples
    /// ```no_run
    /// use webfetch::fetch;
    ///
    /// let builder = fetch("https://example.com/api").headers([
    ///     ("accept", "application/json"),
    ///     ("accept-language", "en"),
    /// ]);
    /// ```
    #[must_use]
    pub fn headers<'a, I>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.try_map(move |request| {
            for (name, value) in &pairs {
                request.headers_mut().set(name, value)?;
            }
            Ok(())
        })
    }

    /// Removes every value stored under `name`.
    #[must_use]
    pub fn remove_header(self, name: &str) -> Self {
        let name = name.to_string();
        self.map(move |request| request.headers_mut().delete(&name))
    }
}
