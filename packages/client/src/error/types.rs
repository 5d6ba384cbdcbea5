use std::error::Error as StdError;
use std::fmt;

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Represents errors that can occur while building, dispatching or
/// consuming a fetch exchange.
#[derive(Clone)]
pub struct Error {
    inner: Box<Inner>,
}

pub(crate) struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    url: Option<url::Url>,
}

impl Clone for Inner {
    fn clone(&self) -> Self {
        Inner {
            kind: self.kind,
            source: None, // trait-object sources cannot be cloned
            url: self.url.clone(),
        }
    }
}

/// Machine-readable classification of a fetch failure.
///
/// [`Kind::as_str`] yields the stable tag callers can match on without
/// destructuring the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Invalid input while constructing a request, response or header map.
    Builder,
    /// Operating-system level transport failure (DNS, connect, reset).
    System,
    /// The exchange as a whole exceeded the request timeout.
    RequestTimeout,
    /// Reading the response body exceeded the body timeout.
    BodyTimeout,
    /// Accumulated body bytes exceeded the configured size limit.
    MaxSize,
    /// The redirect chain exceeded the follow limit.
    MaxRedirect,
    /// A redirect arrived while the policy is `error`.
    NoRedirect,
    /// A redirect arrived that cannot be replayed (streaming request body).
    UnsupportedRedirect,
    /// The caller aborted the exchange through its signal.
    Aborted,
    /// A body was consumed a second time.
    BodyUsed,
    /// Response content could not be decoded.
    Decode,
}

impl Kind {
    /// Stable wire-level tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Builder => "builder",
            Kind::System => "system",
            Kind::RequestTimeout => "request-timeout",
            Kind::BodyTimeout => "body-timeout",
            Kind::MaxSize => "max-size",
            Kind::MaxRedirect => "max-redirect",
            Kind::NoRedirect => "no-redirect",
            Kind::UnsupportedRedirect => "unsupported-redirect",
            Kind::Aborted => "aborted",
            Kind::BodyUsed => "body-used",
            Kind::Decode => "decode",
        }
    }
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub(crate) fn with<E: Into<BoxError>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    /// Attach the URL the failure happened against.
    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    /// The classification of this error.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// The URL associated with this error, if any.
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("webfetch::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::System => f.write_str("network error")?,
            Kind::RequestTimeout => f.write_str("request timed out")?,
            Kind::BodyTimeout => f.write_str("response body read timed out")?,
            Kind::MaxSize => f.write_str("content size over limit")?,
            Kind::MaxRedirect => f.write_str("maximum redirect reached")?,
            Kind::NoRedirect => f.write_str("redirect received with redirect mode set to error")?,
            Kind::UnsupportedRedirect => {
                f.write_str("cannot follow redirect with a streaming body")?;
            }
            Kind::Aborted => f.write_str("the operation was aborted")?,
            Kind::BodyUsed => f.write_str("body used already")?,
            Kind::Decode => f.write_str("error decoding response body")?,
        }

        if let Some(ref url) = self.inner.url {
            write!(f, " for url ({url})")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
