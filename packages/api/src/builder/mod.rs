//! Fluent request builder.
//!
//! [`FetchBuilder`] collects request options through chained calls and
//! dispatches with [`send`](FetchBuilder::send). Construction errors (a bad
//! URL, an invalid header name, a body on a GET) are deferred: the chain
//! keeps accepting calls and the first error surfaces when the request is
//! built or sent.

pub mod auth;
pub mod body;
pub mod core;
pub mod headers;
pub mod methods;

pub use self::core::FetchBuilder;
