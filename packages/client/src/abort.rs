//! Cooperative cancellation for fetch exchanges.
//!
//! An [`AbortController`] owns the cancellation source; the [`AbortSignal`]
//! handed to a request observes it. Aborting is idempotent and visible both
//! before dispatch and while a response body is still streaming.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Owner side of an abort signal.
#[derive(Debug, Default)]
pub struct AbortController {
    token: CancellationToken,
}

impl AbortController {
    /// Creates a controller with an un-aborted signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal observing this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    /// Aborts every exchange holding a signal from this controller.
    /// Aborting more than once has no further effect.
    pub fn abort(&self) {
        self.token.cancel();
    }
}

/// Observer side of an abort signal, attachable to a request.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Returns true once the owning controller has aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the owning controller aborts. Resolves immediately if
    /// it already has.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub(crate) fn into_wait(self) -> WaitForCancellationFutureOwned {
        self.token.cancelled_owned()
    }
}

pin_project! {
    /// Wraps a body stream so an abort poisons it: pending and future reads
    /// observe an `aborted` error instead of hanging on a dead exchange.
    pub(crate) struct AbortOnSignal<S> {
        #[pin]
        inner: S,
        #[pin]
        cancelled: WaitForCancellationFutureOwned,
        finished: bool,
    }
}

impl<S> AbortOnSignal<S> {
    pub(crate) fn new(inner: S, signal: AbortSignal) -> Self {
        AbortOnSignal {
            inner,
            cancelled: signal.into_wait(),
            finished: false,
        }
    }
}

impl<S> Stream for AbortOnSignal<S>
where
    S: Stream<Item = crate::Result<Bytes>>,
{
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        // The abort check runs first so cancellation wins a race against
        // buffered data.
        if this.cancelled.poll(cx).is_ready() {
            *this.finished = true;
            return Poll::Ready(Some(Err(crate::error::aborted())));
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(None) => {
                *this.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
