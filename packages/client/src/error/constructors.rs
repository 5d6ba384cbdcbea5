use super::helpers::{Aborted, BadScheme, MissingHost, OverLimit, TimedOut};
use super::types::{BoxError, Error, Kind};

/// Creates an `Error` for invalid construction input.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a URL whose scheme is not http or https.
pub fn url_bad_scheme(url: url::Url) -> Error {
    Error::new(Kind::Builder).with(BadScheme).with_url(url)
}

/// Creates an `Error` for a URL without a host component.
pub fn url_missing_host(url: url::Url) -> Error {
    Error::new(Kind::Builder).with(MissingHost).with_url(url)
}

/// Creates an `Error` for an operating-system level transport failure.
pub fn system<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::System).with(e.into())
}

/// Creates an `Error` for an exchange that ran past the request timeout.
pub fn request_timeout() -> Error {
    Error::new(Kind::RequestTimeout).with(TimedOut)
}

/// Creates an `Error` for a body read that ran past the body timeout.
pub fn body_timeout() -> Error {
    Error::new(Kind::BodyTimeout).with(TimedOut)
}

/// Creates an `Error` for a body that overran its size limit.
pub fn max_size(limit: u64) -> Error {
    Error::new(Kind::MaxSize).with(OverLimit { limit })
}

/// Creates an `Error` for a redirect chain longer than the follow limit.
pub fn max_redirect(url: url::Url) -> Error {
    Error::new(Kind::MaxRedirect).with_url(url)
}

/// Creates an `Error` for a redirect received under the `error` policy.
pub fn no_redirect(url: url::Url) -> Error {
    Error::new(Kind::NoRedirect).with_url(url)
}

/// Creates an `Error` for a redirect that cannot replay its request body.
pub fn unsupported_redirect(url: url::Url) -> Error {
    Error::new(Kind::UnsupportedRedirect).with_url(url)
}

/// Creates an `Error` for an exchange aborted through its signal.
pub fn aborted() -> Error {
    Error::new(Kind::Aborted).with(Aborted)
}

/// Creates an `Error` for a second consumption of the same body.
pub fn body_used() -> Error {
    Error::new(Kind::BodyUsed)
}

/// Creates an `Error` for response content that could not be decoded.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}
