use std::fmt;

/// A marker type to indicate that an exchange or body read timed out.
#[derive(Debug)]
pub struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A marker type to indicate that a URL scheme was not http or https.
#[derive(Debug)]
pub struct BadScheme;

impl fmt::Display for BadScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("URL scheme is not http or https")
    }
}

impl std::error::Error for BadScheme {}

/// A marker type to indicate that a URL carries no host.
#[derive(Debug)]
pub struct MissingHost;

impl fmt::Display for MissingHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("URL has no host")
    }
}

impl std::error::Error for MissingHost {}

/// A marker type to indicate that the caller aborted the exchange.
#[derive(Debug)]
pub struct Aborted;

impl fmt::Display for Aborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("aborted by signal")
    }
}

impl std::error::Error for Aborted {}

/// Carries the size limit a body overran.
#[derive(Debug)]
pub struct OverLimit {
    pub limit: u64,
}

impl fmt::Display for OverLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "over limit: {} bytes", self.limit)
    }
}

impl std::error::Error for OverLimit {}
