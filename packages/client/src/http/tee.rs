//! Two-branch fan-out for streaming bodies.
//!
//! `clone()` on an unconsumed streaming body splits it into two branches
//! that replay the same chunk sequence independently. Whichever branch is
//! polled first pulls from the source and queues a copy for its sibling.
//! Queues are unbounded; the high water mark is a reporting hint, not
//! backpressure (enforcing it would deadlock a caller that drains one
//! branch to completion before touching the other).

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::body::ByteStream;

pub(crate) fn tee(source: ByteStream, high_water_mark: usize) -> (ByteStream, ByteStream) {
    let shared = Arc::new(Mutex::new(Shared {
        source,
        done: false,
        high_water_mark,
        branches: [BranchState::default(), BranchState::default()],
    }));

    let left = TeeBranch {
        shared: Arc::clone(&shared),
        index: 0,
    };
    let right = TeeBranch { shared, index: 1 };

    (left.boxed(), right.boxed())
}

struct Shared {
    source: ByteStream,
    done: bool,
    high_water_mark: usize,
    branches: [BranchState; 2],
}

#[derive(Default)]
struct BranchState {
    queue: VecDeque<crate::Result<Bytes>>,
    queued_bytes: usize,
    waker: Option<Waker>,
    detached: bool,
    warned: bool,
}

struct TeeBranch {
    shared: Arc<Mutex<Shared>>,
    index: usize,
}

impl Stream for TeeBranch {
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut shared = self
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let index = self.index;

        if let Some(item) = shared.branches[index].queue.pop_front() {
            if let Ok(chunk) = &item {
                shared.branches[index].queued_bytes -= chunk.len();
            }
            return Poll::Ready(Some(item));
        }

        if shared.done {
            return Poll::Ready(None);
        }

        match shared.source.poll_next_unpin(cx) {
            Poll::Ready(Some(item)) => {
                let sibling = 1 - index;
                if !shared.branches[sibling].detached {
                    if let Ok(chunk) = &item {
                        shared.branches[sibling].queued_bytes += chunk.len();
                    }
                    // Bytes clones are refcounted; error clones keep kind
                    // and url but drop the source.
                    shared.branches[sibling].queue.push_back(item.clone());
                    let over_mark =
                        shared.branches[sibling].queued_bytes > shared.high_water_mark;
                    if over_mark && !shared.branches[sibling].warned {
                        shared.branches[sibling].warned = true;
                        tracing::debug!(
                            target: "webfetch::body",
                            queued_bytes = shared.branches[sibling].queued_bytes,
                            high_water_mark = shared.high_water_mark,
                            "cloned body branch buffering beyond high water mark"
                        );
                    }
                    if let Some(waker) = shared.branches[sibling].waker.take() {
                        waker.wake();
                    }
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                shared.done = true;
                let sibling = 1 - index;
                if let Some(waker) = shared.branches[sibling].waker.take() {
                    waker.wake();
                }
                Poll::Ready(None)
            }
            Poll::Pending => {
                shared.branches[index].waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl Drop for TeeBranch {
    fn drop(&mut self) {
        let mut shared = self
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let branch = &mut shared.branches[self.index];
        branch.detached = true;
        branch.queue.clear();
        branch.queued_bytes = 0;
    }
}
