use url::Url;

use crate::error;

/// A trait to try to convert some type into a `Url`.
///
/// This trait is "sealed", such that only types within webfetch can
/// implement it.
pub trait IntoUrl: IntoUrlSealed {}

impl IntoUrl for Url {}
impl IntoUrl for String {}
impl IntoUrl for &str {}
impl IntoUrl for &String {}

pub trait IntoUrlSealed {
    /// Besides parsing as a valid `Url`, the URL must be addressable in a
    /// network request: an http or https scheme and a host.
    ///
    /// # Errors
    ///
    /// Returns a builder error if the string is malformed, the scheme is
    /// not http/https, or the URL lacks a host.
    fn into_url(self) -> crate::Result<Url>;

    fn as_str(&self) -> &str;
}

impl IntoUrlSealed for Url {
    fn into_url(self) -> crate::Result<Url> {
        if !matches!(self.scheme(), "http" | "https") {
            return Err(error::url_bad_scheme(self));
        }
        if !self.has_host() {
            return Err(error::url_missing_host(self));
        }
        Ok(self)
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for &str {
    fn into_url(self) -> crate::Result<Url> {
        Url::parse(self).map_err(error::builder)?.into_url()
    }

    fn as_str(&self) -> &str {
        self
    }
}

impl IntoUrlSealed for &String {
    fn into_url(self) -> crate::Result<Url> {
        (&**self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for String {
    fn into_url(self) -> crate::Result<Url> {
        (&*self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}
