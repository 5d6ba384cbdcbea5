//! Streaming content decoding for response bodies.
//!
//! Decoders run in push mode: compressed chunks are fed in as they arrive
//! off the wire and decoded output is handed to the body stream, so large
//! bodies never accumulate in compressed form. Truncated gzip/deflate tails
//! are tolerated at end of stream; corruption detected mid-stream surfaces
//! as a `system` error when the body is consumed.

use std::io::{self, Write};
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use brotli::DecompressorWriter;
use bytes::Bytes;
use flate2::write::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use futures_util::{Stream, StreamExt};
use http::{Method, StatusCode};
use pin_project_lite::pin_project;

use super::body::ByteStream;
use super::headers::Headers;

/// Output sink shared between a decoder and the stream adapter draining it.
#[derive(Clone, Default)]
struct SharedBuf {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    fn take(&self) -> Vec<u8> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        mem::take(&mut *guard)
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Inner {
    Identity,
    Gzip(MultiGzDecoder<SharedBuf>),
    Zlib(ZlibDecoder<SharedBuf>),
    RawDeflate(DeflateDecoder<SharedBuf>),
    Brotli(Box<DecompressorWriter<SharedBuf>>),
    /// Deflate responses are ambiguous on the wire: some servers send zlib
    /// framing, some raw blocks. Decided by the first payload byte.
    DeflateUndecided,
}

/// Incremental decoder for one `Content-Encoding` token.
pub(crate) struct ContentDecoder {
    inner: Inner,
    output: SharedBuf,
}

impl ContentDecoder {
    pub(crate) fn identity() -> Self {
        ContentDecoder {
            inner: Inner::Identity,
            output: SharedBuf::default(),
        }
    }

    /// Decoder for an encoding token, or `None` when the token is unknown
    /// and content must pass through untouched.
    pub(crate) fn for_encoding(token: &str) -> Option<Self> {
        let output = SharedBuf::default();
        let inner = match token.trim() {
            "gzip" | "x-gzip" => Inner::Gzip(MultiGzDecoder::new(output.clone())),
            "deflate" | "x-deflate" => Inner::DeflateUndecided,
            "br" => Inner::Brotli(Box::new(DecompressorWriter::new(output.clone(), 4096))),
            "identity" | "" => Inner::Identity,
            _ => return None,
        };
        Some(ContentDecoder { inner, output })
    }

    /// Feeds one compressed chunk, returning whatever decoded output it
    /// produced. Empty output is normal while a frame is still buffering.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> io::Result<Vec<u8>> {
        match &mut self.inner {
            Inner::Identity => return Ok(chunk.to_vec()),
            Inner::DeflateUndecided => {
                if chunk.is_empty() {
                    return Ok(Vec::new());
                }
                // Zlib framing always opens with a CMF byte whose low
                // nibble is 8 (deflate method).
                self.inner = if chunk[0] & 0x0F == 0x08 {
                    Inner::Zlib(ZlibDecoder::new(self.output.clone()))
                } else {
                    Inner::RawDeflate(DeflateDecoder::new(self.output.clone()))
                };
                return self.feed(chunk);
            }
            Inner::Gzip(decoder) => decoder.write_all(chunk)?,
            Inner::Zlib(decoder) => decoder.write_all(chunk)?,
            Inner::RawDeflate(decoder) => decoder.write_all(chunk)?,
            Inner::Brotli(decoder) => decoder.write_all(chunk)?,
        }
        Ok(self.output.take())
    }

    /// Ends the stream, returning any held-back output. Truncated input is
    /// tolerated here; servers routinely close mid-trailer.
    pub(crate) fn finish(self) -> Vec<u8> {
        match self.inner {
            Inner::Identity | Inner::DeflateUndecided => Vec::new(),
            Inner::Gzip(decoder) => finish_flate("gzip", decoder.finish(), &self.output),
            Inner::Zlib(decoder) => finish_flate("deflate", decoder.finish(), &self.output),
            Inner::RawDeflate(decoder) => {
                finish_flate("raw deflate", decoder.finish(), &self.output)
            }
            Inner::Brotli(mut decoder) => {
                let _ = decoder.flush();
                if decoder.into_inner().is_err() {
                    tracing::debug!(
                        target: "webfetch::decode",
                        "brotli stream ended before its final block, keeping partial output"
                    );
                }
                self.output.take()
            }
        }
    }
}

fn finish_flate(codec: &str, result: io::Result<SharedBuf>, output: &SharedBuf) -> Vec<u8> {
    if let Err(error) = result {
        tracing::debug!(
            target: "webfetch::decode",
            codec = codec,
            error = %error,
            "compressed stream ended early, keeping partial output"
        );
    }
    output.take()
}

/// Whether a response qualifies for content decoding at all.
pub(crate) fn should_decode(
    compress: bool,
    method: &Method,
    status: StatusCode,
    headers: &Headers,
) -> bool {
    compress
        && method != Method::HEAD
        && headers.has("content-encoding")
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

/// Wraps a raw body stream with the decoder for `encoding`. Unknown
/// encodings pass the stream through untouched.
pub(crate) fn decode_stream(encoding: &str, raw: ByteStream) -> ByteStream {
    match ContentDecoder::for_encoding(encoding) {
        Some(decoder) => DecodeStream::new(raw, decoder).boxed(),
        None => {
            tracing::debug!(
                target: "webfetch::decode",
                encoding = encoding,
                "unknown content-encoding, passing body through raw"
            );
            raw
        }
    }
}

pin_project! {
    struct DecodeStream<S> {
        #[pin]
        inner: S,
        decoder: Option<ContentDecoder>,
        done: bool,
    }
}

impl<S> DecodeStream<S> {
    fn new(inner: S, decoder: ContentDecoder) -> Self {
        DecodeStream {
            inner,
            decoder: Some(decoder),
            done: false,
        }
    }
}

impl<S> Stream for DecodeStream<S>
where
    S: Stream<Item = crate::Result<Bytes>>,
{
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Err(error))) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    let decoder = match this.decoder.as_mut() {
                        Some(decoder) => decoder,
                        None => return Poll::Ready(None),
                    };
                    match decoder.feed(&chunk) {
                        Ok(output) if output.is_empty() => continue,
                        Ok(output) => return Poll::Ready(Some(Ok(Bytes::from(output)))),
                        Err(error) => {
                            *this.done = true;
                            return Poll::Ready(Some(Err(crate::error::system(error))));
                        }
                    }
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    let output = match this.decoder.take() {
                        Some(decoder) => decoder.finish(),
                        None => Vec::new(),
                    };
                    if output.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(Bytes::from(output))));
                }
            }
        }
    }
}
