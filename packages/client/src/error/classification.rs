use std::error::Error as StdError;
use std::io;

use super::helpers::TimedOut;
use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error came from request or response construction.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.kind(), Kind::Builder)
    }

    /// Returns true if the error is an operating-system level failure.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self.kind(), Kind::System)
    }

    /// Returns true if the error is related to a timeout, either through
    /// its kind or anywhere in its source chain.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.kind(), Kind::RequestTimeout | Kind::BodyTimeout) {
            return true;
        }

        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<TimedOut>() {
                return true;
            }
            if let Some(io) = err.downcast_ref::<io::Error>() {
                if io.kind() == io::ErrorKind::TimedOut {
                    return true;
                }
            }
            source = err.source();
        }

        false
    }

    /// Returns true if the caller aborted the exchange.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self.kind(), Kind::Aborted)
    }

    /// Returns true if a body overran its size limit.
    #[must_use]
    pub fn is_max_size(&self) -> bool {
        matches!(self.kind(), Kind::MaxSize)
    }

    /// Returns true if the error came out of redirect handling.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(
            self.kind(),
            Kind::MaxRedirect | Kind::NoRedirect | Kind::UnsupportedRedirect
        )
    }

    /// Returns true if a body was consumed twice.
    #[must_use]
    pub fn is_body_used(&self) -> bool {
        matches!(self.kind(), Kind::BodyUsed)
    }

    /// Returns true if response content could not be decoded.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.kind(), Kind::Decode)
    }

    /// The raw operating-system error code carried by this error, if the
    /// source chain bottoms out in an [`io::Error`] that has one.
    #[must_use]
    pub fn os_code(&self) -> Option<i32> {
        let mut source = self.source();
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<io::Error>() {
                if let Some(code) = io.raw_os_error() {
                    return Some(code);
                }
            }
            source = err.source();
        }
        None
    }
}
