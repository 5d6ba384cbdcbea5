pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use helpers::{Aborted, BadScheme, MissingHost, OverLimit, TimedOut};
pub use types::{Error, Kind, Result};

pub(crate) use types::BoxError;
