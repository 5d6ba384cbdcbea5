//! Fetch-style header map over standard http crate types.
//!
//! Names are case-insensitive and may carry multiple values. Reads join
//! values the way the fetch contract does; iteration is name-sorted so two
//! maps built in different orders present identically.

use std::collections::BTreeMap;

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

/// Header-related validation errors.
#[derive(Debug, Clone, Error)]
pub enum HeaderError {
    /// The header name is not a valid HTTP token.
    #[error("invalid header name: {name:?}")]
    InvalidName {
        /// The rejected name
        name: String,
    },
    /// The header value carries bytes HTTP forbids.
    #[error("invalid value for header {name:?}")]
    InvalidValue {
        /// The name whose value was rejected
        name: String,
    },
}

/// A case-insensitive multi-valued header map with fetch read semantics.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HeaderMap,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Headers {
            inner: HeaderMap::new(),
        }
    }

    /// Builds a header map from name/value pairs, failing on the first
    /// invalid pair.
    pub fn from_pairs<I, N, V>(pairs: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.append(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    /// Builds a header map from raw wire pairs, dropping pairs that do not
    /// survive validation instead of failing the response.
    #[must_use]
    pub fn from_raw_parts<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut inner = HeaderMap::new();
        for (name, value) in pairs {
            let parsed_name = match HeaderName::from_bytes(name.as_ref().as_bytes()) {
                Ok(n) => n,
                Err(_) => {
                    tracing::warn!(
                        target: "webfetch::headers",
                        name = name.as_ref(),
                        "dropping response header with invalid name"
                    );
                    continue;
                }
            };
            let parsed_value = match HeaderValue::from_bytes(value.as_ref()) {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(
                        target: "webfetch::headers",
                        name = name.as_ref(),
                        "dropping response header with invalid value"
                    );
                    continue;
                }
            };
            inner.append(parsed_name, parsed_value);
        }
        Headers { inner }
    }

    /// Appends a value, keeping any values already present for the name.
    pub fn append(&mut self, name: &str, value: &str) -> crate::Result<()> {
        let (name, value) = validate(name, value)?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Sets a header, replacing every value already present for the name.
    pub fn set(&mut self, name: &str, value: &str) -> crate::Result<()> {
        let (name, value) = validate(name, value)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Removes all values for a name. Unknown names are a no-op.
    pub fn delete(&mut self, name: &str) {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            self.inner.remove(name);
        }
    }

    /// Returns true if at least one value exists for the name.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        HeaderName::from_bytes(name.as_bytes())
            .map(|n| self.inner.contains_key(&n))
            .unwrap_or(false)
    }

    /// All values for the name joined with `", "`, or `None` when absent.
    ///
    /// `content-encoding` reads back lowercased so encoding dispatch never
    /// depends on what case the server chose.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        let mut values = self.inner.get_all(&name).iter().peekable();
        values.peek()?;

        let joined = values
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");

        if name == header::CONTENT_ENCODING {
            Some(joined.to_ascii_lowercase())
        } else {
            Some(joined)
        }
    }

    /// Every raw value for the name, in append order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<String> {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => self
                .inner
                .get_all(&name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Lowercase name to raw value list, for callers that need unjoined
    /// multi-values such as `set-cookie`.
    #[must_use]
    pub fn raw(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in self.inner.keys() {
            out.insert(name.as_str().to_owned(), self.get_all(name.as_str()));
        }
        out
    }

    /// Name-sorted `(name, joined value)` entries.
    #[must_use]
    pub fn iter(&self) -> Vec<(String, String)> {
        let mut names: Vec<&HeaderName> = self.inner.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
            .into_iter()
            .filter_map(|name| {
                self.get(name.as_str())
                    .map(|value| (name.as_str().to_owned(), value))
            })
            .collect()
    }

    /// Sorted header names.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.iter().into_iter().map(|(name, _)| name).collect()
    }

    /// Joined values in sorted-name order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.iter().into_iter().map(|(_, value)| value).collect()
    }

    /// Visits each `(name, joined value)` entry in sorted-name order.
    pub fn for_each<F: FnMut(&str, &str)>(&self, mut f: F) {
        for (name, value) in self.iter() {
            f(&name, &value);
        }
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.keys_len()
    }

    /// Returns true when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn as_map(&self) -> &HeaderMap {
        &self.inner
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut HeaderMap {
        &mut self.inner
    }
}

fn validate(name: &str, value: &str) -> crate::Result<(HeaderName, HeaderValue)> {
    let parsed_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
        crate::error::builder(HeaderError::InvalidName {
            name: name.to_owned(),
        })
    })?;
    let parsed_value = HeaderValue::from_str(value).map_err(|_| {
        crate::error::builder(HeaderError::InvalidValue {
            name: name.to_owned(),
        })
    })?;
    Ok((parsed_name, parsed_value))
}

impl From<HeaderMap> for Headers {
    fn from(inner: HeaderMap) -> Self {
        Headers { inner }
    }
}

impl From<Headers> for HeaderMap {
    fn from(headers: Headers) -> Self {
        headers.inner
    }
}
