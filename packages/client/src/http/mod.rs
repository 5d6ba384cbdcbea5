//! HTTP data model: headers, bodies, requests and responses, plus the
//! content decoding and charset machinery the response path runs through.

pub mod body;
pub(crate) mod charset;
pub(crate) mod decode;
pub mod headers;
pub mod into_url;
pub mod request;
pub mod response;
pub(crate) mod tee;

pub use body::{Blob, Body, ByteStream};
pub use headers::{HeaderError, Headers};
pub use into_url::IntoUrl;
pub use request::{AgentSelection, RedirectPolicy, Request};
pub use response::{Response, ResponseType};
