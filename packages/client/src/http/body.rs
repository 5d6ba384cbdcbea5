//! Single-use request/response bodies.
//!
//! A body owns one payload source and can be consumed exactly once through
//! [`Body::bytes`], [`Body::text`], [`Body::json`], [`Body::blob`] or
//! [`Body::stream`]. Consumption of streaming sources enforces the owner's
//! size cap and body timeout; fixed sources resolve immediately and are
//! exempt, matching the fetch contract.

use std::fmt;
use std::mem;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use url::Url;

use super::charset;
use super::tee::tee;
use crate::connect::WireBody;
use crate::error;

/// Chunk stream used for streaming bodies throughout the crate.
pub type ByteStream = BoxStream<'static, crate::Result<Bytes>>;

/// Default buffering hint for cloned body branches.
pub(crate) const DEFAULT_HIGH_WATER_MARK: usize = 16384;

/// A byte payload with a declared media type.
#[derive(Debug, Clone, Default)]
pub struct Blob {
    content: Bytes,
    content_type: String,
}

impl Blob {
    /// Creates a blob from bytes and a media type string.
    pub fn new(content: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Blob {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// The declared media type, possibly empty.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Borrows the payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Consumes the blob, keeping only the payload.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.content
    }
}

pub(crate) enum BodySource {
    Empty,
    Text(String),
    Bytes(Bytes),
    Stream(ByteStream),
    Blob(Blob),
    /// A stream that was already handed to the wire. The content is gone,
    /// but the source keeps blocking redirect replays the way a live
    /// stream does.
    Spent,
}

impl BodySource {
    /// Splits a source into two sources replaying the same content.
    /// Streams are teed; value sources are copied.
    fn split(self, high_water_mark: usize) -> (BodySource, BodySource) {
        match self {
            BodySource::Empty => (BodySource::Empty, BodySource::Empty),
            BodySource::Text(text) => (BodySource::Text(text.clone()), BodySource::Text(text)),
            BodySource::Bytes(bytes) => {
                (BodySource::Bytes(bytes.clone()), BodySource::Bytes(bytes))
            }
            BodySource::Blob(blob) => (BodySource::Blob(blob.clone()), BodySource::Blob(blob)),
            BodySource::Stream(stream) => {
                let (left, right) = tee(stream, high_water_mark);
                (BodySource::Stream(left), BodySource::Stream(right))
            }
            BodySource::Spent => (BodySource::Spent, BodySource::Spent),
        }
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySource::Empty => f.write_str("Empty"),
            BodySource::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            BodySource::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            BodySource::Stream(_) => f.write_str("Stream"),
            BodySource::Blob(blob) => f.debug_tuple("Blob").field(&blob.size()).finish(),
            BodySource::Spent => f.write_str("Spent"),
        }
    }
}

/// A single-use request or response payload.
#[derive(Debug)]
pub struct Body {
    source: BodySource,
    used: bool,
    size_limit: u64,
    timeout: Duration,
    url: Option<Url>,
    content_type: Option<String>,
    high_water_mark: usize,
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl Body {
    /// A body with no content.
    #[must_use]
    pub fn empty() -> Body {
        Body::from_source(BodySource::Empty)
    }

    pub(crate) fn from_source(source: BodySource) -> Body {
        Body {
            source,
            used: false,
            size_limit: 0,
            timeout: Duration::ZERO,
            url: None,
            content_type: None,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }

    /// Wraps an arbitrary chunk stream as a body. Stream errors surface as
    /// `system` errors when the body is consumed or sent.
    pub fn wrap_stream<S, B, E>(stream: S) -> Body
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: Into<Bytes>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mapped = stream
            .map(|item| item.map(Into::into).map_err(error::system))
            .boxed();
        Body::from_source(BodySource::Stream(mapped))
    }

    /// Returns true once the body has been consumed.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Clones an unconsumed body. Streams are split into two independent
    /// branches, one staying with `self`; value sources are copied.
    pub fn try_clone(&mut self) -> crate::Result<Body> {
        if self.used {
            return Err(self.used_error());
        }
        let source = mem::replace(&mut self.source, BodySource::Empty);
        let (kept, cloned) = source.split(self.high_water_mark);
        self.source = kept;
        Ok(Body {
            source: cloned,
            used: false,
            size_limit: self.size_limit,
            timeout: self.timeout,
            url: self.url.clone(),
            content_type: self.content_type.clone(),
            high_water_mark: self.high_water_mark,
        })
    }

    /// Collects the whole payload into one buffer, enforcing the size cap
    /// and body timeout for streaming sources.
    pub async fn bytes(&mut self) -> crate::Result<Bytes> {
        if self.used {
            return Err(self.used_error());
        }
        self.used = true;

        match mem::replace(&mut self.source, BodySource::Empty) {
            BodySource::Empty | BodySource::Spent => Ok(Bytes::new()),
            BodySource::Text(text) => Ok(Bytes::from(text)),
            BodySource::Bytes(bytes) => Ok(bytes),
            BodySource::Blob(blob) => Ok(blob.into_bytes()),
            BodySource::Stream(stream) => self.collect_stream(stream).await,
        }
    }

    /// Decodes the payload as text. String sources resolve without touching
    /// the stream machinery; everything else collects bytes first, then
    /// applies charset detection for textual media types.
    pub async fn text(&mut self) -> crate::Result<String> {
        if self.used {
            return Err(self.used_error());
        }
        if matches!(self.source, BodySource::Text(_)) {
            self.used = true;
            if let BodySource::Text(text) = mem::replace(&mut self.source, BodySource::Empty) {
                return Ok(text);
            }
        }
        let content_type = self.content_type.clone();
        let bytes = self.bytes().await?;
        Ok(charset::decode_text(&bytes, content_type.as_deref()))
    }

    /// Parses the payload as JSON. String sources take the general byte
    /// path here, unlike [`Body::text`].
    pub async fn json<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        let url = self.url.clone();
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            let err = error::decode(e);
            match url {
                Some(url) => err.with_url(url),
                None => err,
            }
        })
    }

    /// Collects the payload into a [`Blob`] typed by the owner's
    /// `Content-Type`, or an empty type when none is known.
    pub async fn blob(&mut self) -> crate::Result<Blob> {
        let content_type = self.content_type.clone().unwrap_or_default();
        let bytes = self.bytes().await?;
        Ok(Blob::new(bytes, content_type))
    }

    /// Takes the payload as a raw chunk stream, marking the body used.
    /// Value sources yield one chunk. Size and timeout guards do not apply
    /// to a raw handoff; the caller owns pacing from here.
    pub fn stream(&mut self) -> crate::Result<ByteStream> {
        if self.used {
            return Err(self.used_error());
        }
        self.used = true;

        Ok(match mem::replace(&mut self.source, BodySource::Empty) {
            BodySource::Empty | BodySource::Spent => futures_util::stream::empty().boxed(),
            BodySource::Text(text) => {
                futures_util::stream::iter(vec![Ok(Bytes::from(text))]).boxed()
            }
            BodySource::Bytes(bytes) => futures_util::stream::iter(vec![Ok(bytes)]).boxed(),
            BodySource::Blob(blob) => {
                futures_util::stream::iter(vec![Ok(blob.into_bytes())]).boxed()
            }
            BodySource::Stream(stream) => stream,
        })
    }

    async fn collect_stream(&self, mut stream: ByteStream) -> crate::Result<Bytes> {
        let limit = self.size_limit;
        let drain = async {
            let mut buffer: Vec<u8> = Vec::new();
            let mut total: u64 = 0;
            while let Some(item) = stream.next().await {
                let chunk = item.map_err(|e| self.contextualize(e))?;
                total += chunk.len() as u64;
                if limit > 0 && total > limit {
                    // Dropping the stream here is what cancels the
                    // underlying transfer at the moment of overflow.
                    return Err(self.contextualize(error::max_size(limit)));
                }
                buffer.extend_from_slice(&chunk);
            }
            Ok(Bytes::from(buffer))
        };

        if self.timeout > Duration::ZERO {
            match tokio::time::timeout(self.timeout, drain).await {
                Ok(result) => result,
                Err(_) => Err(self.contextualize(error::body_timeout())),
            }
        } else {
            drain.await
        }
    }

    fn used_error(&self) -> crate::Error {
        self.contextualize(error::body_used())
    }

    fn contextualize(&self, err: crate::Error) -> crate::Error {
        match (&self.url, err.url()) {
            (Some(url), None) => err.with_url(url.clone()),
            _ => err,
        }
    }

    /// Byte length when knowable without consuming the source.
    pub(crate) fn len_hint(&self) -> Option<u64> {
        match &self.source {
            BodySource::Empty => Some(0),
            BodySource::Text(text) => Some(text.len() as u64),
            BodySource::Bytes(bytes) => Some(bytes.len() as u64),
            BodySource::Blob(blob) => Some(blob.size()),
            BodySource::Stream(_) | BodySource::Spent => None,
        }
    }

    /// True when the body cannot be resent on a redirect hop: the source
    /// is a stream, live or already handed to the wire.
    pub(crate) fn blocks_replay(&self) -> bool {
        matches!(self.source, BodySource::Stream(_) | BodySource::Spent)
    }

    pub(crate) fn has_content(&self) -> bool {
        !matches!(self.source, BodySource::Empty)
    }

    /// Media type implied by the source, used when the caller set none.
    pub(crate) fn inferred_content_type(&self) -> Option<String> {
        match &self.source {
            BodySource::Text(_) => Some("text/plain;charset=UTF-8".to_owned()),
            BodySource::Blob(blob) if !blob.content_type().is_empty() => {
                Some(blob.content_type().to_owned())
            }
            _ => None,
        }
    }

    /// Produces the wire shape for one dispatch. Value sources are copied
    /// so a redirect can replay them; a stream source is taken and cannot
    /// be replayed.
    pub(crate) fn wire_body(&mut self) -> WireBody {
        match &mut self.source {
            BodySource::Empty | BodySource::Spent => WireBody::Empty,
            BodySource::Text(text) => WireBody::Full(Bytes::from(text.clone())),
            BodySource::Bytes(bytes) => WireBody::Full(bytes.clone()),
            BodySource::Blob(blob) => WireBody::Full(blob.content.clone()),
            BodySource::Stream(_) => {
                match mem::replace(&mut self.source, BodySource::Spent) {
                    BodySource::Stream(stream) => WireBody::Streaming(stream),
                    _ => WireBody::Empty,
                }
            }
        }
    }

    pub(crate) fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub(crate) fn set_content_type_hint(&mut self, content_type: Option<String>) {
        self.content_type = content_type;
    }

    pub(crate) fn set_size_limit(&mut self, limit: u64) {
        self.size_limit = limit;
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub(crate) fn set_high_water_mark(&mut self, high_water_mark: usize) {
        self.high_water_mark = high_water_mark;
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Body {
        Body::from_source(BodySource::Text(text.to_owned()))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Body {
        Body::from_source(BodySource::Text(text))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Body {
        Body::from_source(BodySource::Bytes(bytes))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Body {
        Body::from_source(BodySource::Bytes(Bytes::from(bytes)))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Body {
        Body::from_source(BodySource::Bytes(Bytes::from_static(bytes)))
    }
}

impl From<Blob> for Body {
    fn from(blob: Blob) -> Body {
        Body::from_source(BodySource::Blob(blob))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(chunks: Vec<&'static str>) -> Body {
        Body::wrap_stream(futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn consumption_happens_at_most_once() {
        let mut body = Body::from("hello");
        assert!(!body.is_used());
        assert_eq!(body.text().await.expect("first read"), "hello");
        assert!(body.is_used());

        let err = body.text().await.expect_err("second read must fail");
        assert!(err.is_body_used());

        let err = body.bytes().await.expect_err("any accessor must fail");
        assert_eq!(err.kind(), &crate::Kind::BodyUsed);
    }

    #[tokio::test]
    async fn used_error_carries_owner_url() {
        let mut body = Body::from("x");
        body.set_url(Url::parse("http://example.com/doc").expect("static URL parses"));
        let _ = body.text().await;
        let err = body.text().await.expect_err("second read must fail");
        assert_eq!(
            err.url().map(Url::as_str),
            Some("http://example.com/doc")
        );
    }

    #[tokio::test]
    async fn stream_bodies_collect_in_order() {
        let mut body = stream_of(vec!["a", "b", "c"]);
        let bytes = body.bytes().await.expect("collects");
        assert_eq!(&bytes[..], b"abc");
    }

    #[tokio::test]
    async fn size_limit_is_a_strict_upper_bound() {
        let mut body = stream_of(vec!["12345"]);
        body.set_size_limit(5);
        assert_eq!(&body.bytes().await.expect("exactly at limit")[..], b"12345");

        let mut body = stream_of(vec!["123", "456"]);
        body.set_size_limit(5);
        let err = body.bytes().await.expect_err("six bytes over five");
        assert!(err.is_max_size());
    }

    #[tokio::test]
    async fn fixed_bodies_ignore_the_size_limit() {
        let mut body = Body::from("this is much longer than two bytes");
        body.set_size_limit(2);
        assert!(body.bytes().await.is_ok());
    }

    #[tokio::test]
    async fn body_timeout_cancels_a_stalled_stream() {
        let mut body = Body::from_source(BodySource::Stream(
            futures_util::stream::pending().boxed(),
        ));
        body.set_timeout(Duration::from_millis(40));
        let err = body.bytes().await.expect_err("stalled stream times out");
        assert_eq!(err.kind(), &crate::Kind::BodyTimeout);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn stream_errors_pass_through_typed() {
        let mut body = Body::wrap_stream(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"head")),
            Err(std::io::Error::other("connection reset")),
        ]));
        let err = body.bytes().await.expect_err("stream error surfaces");
        assert!(err.is_system());
    }

    #[tokio::test]
    async fn json_parses_and_tags_failures() {
        #[derive(serde::Deserialize)]
        struct Payload {
            count: u32,
        }

        let mut body = Body::from(r#"{"count": 3}"#);
        let payload: Payload = body.json().await.expect("valid json");
        assert_eq!(payload.count, 3);

        let mut body = Body::from("not json");
        let err = body
            .json::<serde_json::Value>()
            .await
            .expect_err("invalid json");
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn text_sniffs_charset_from_hint() {
        // "你好" in GBK
        let mut page = Vec::new();
        page.extend_from_slice(b"<html><body>");
        page.extend_from_slice(&[0xC4, 0xE3, 0xBA, 0xC3]);
        page.extend_from_slice(b"</body></html>");

        let mut body = Body::from(page);
        body.set_content_type_hint(Some("text/html; charset=gbk".to_owned()));
        let text = body.text().await.expect("decodes");
        assert!(text.contains("你好"));
    }

    #[tokio::test]
    async fn clone_of_fixed_body_is_independent() {
        let mut body = Body::from("shared");
        let mut copy = body.try_clone().expect("unused body clones");
        assert_eq!(body.text().await.expect("original"), "shared");
        assert_eq!(copy.text().await.expect("copy"), "shared");
    }

    #[tokio::test]
    async fn clone_of_stream_body_replays_both_sides() {
        let mut body = stream_of(vec!["chunk-1", "chunk-2"]);
        let mut copy = body.try_clone().expect("unused body clones");

        let original = body.bytes().await.expect("original side");
        let cloned = copy.bytes().await.expect("cloned side");
        assert_eq!(original, cloned);
        assert_eq!(&original[..], b"chunk-1chunk-2");
    }

    #[tokio::test]
    async fn clone_after_use_fails() {
        let mut body = Body::from("gone");
        let _ = body.text().await;
        let err = body.try_clone().expect_err("used body cannot clone");
        assert!(err.is_body_used());
    }

    #[tokio::test]
    async fn raw_stream_handoff_marks_used() {
        let mut body = Body::from("raw");
        let mut stream = body.stream().expect("handoff");
        assert!(body.is_used());
        let chunk = stream
            .next()
            .await
            .expect("one chunk")
            .expect("chunk is ok");
        assert_eq!(&chunk[..], b"raw");
        assert!(stream.next().await.is_none());
        assert!(body.stream().is_err());
    }

    #[test]
    fn wire_body_copies_fixed_sources_and_takes_streams() {
        let mut body = Body::from("replayable");
        assert!(matches!(body.wire_body(), WireBody::Full(_)));
        assert!(matches!(body.wire_body(), WireBody::Full(_)));
        assert!(!body.blocks_replay());

        let mut body = stream_of(vec!["once"]);
        assert!(body.blocks_replay());
        assert!(matches!(body.wire_body(), WireBody::Streaming(_)));
        assert!(matches!(body.wire_body(), WireBody::Empty));
        // A taken stream still blocks replay; only a rewrite clears it.
        assert!(body.blocks_replay());
    }

    #[test]
    fn len_hint_reports_fixed_sizes_only() {
        assert_eq!(Body::empty().len_hint(), Some(0));
        assert_eq!(Body::from("1234").len_hint(), Some(4));
        assert_eq!(
            Body::from(Blob::new(&b"12345"[..], "text/plain")).len_hint(),
            Some(5)
        );
        assert_eq!(stream_of(vec!["x"]).len_hint(), None);
    }
}
