//! # Drive a stream into a command.
//!
//! [`drive`] pumps items from a stream into a [`Drive`] sink. It is used both
//! for attempt result streams and for restriction (gate) streams.
//!
//! ## Flow
//! ```text
//! drive(stream, token, sink)
//!   │
//!   ├─► drain ready items synchronously (same call stack as the caller)
//!   │       ├─ item  ──► sink.on_item()  ── Stop ──► sink.on_complete()
//!   │       └─ end   ──► sink.on_complete()
//!   │
//!   └─► first Pending:
//!           ├─ runtime available ──► spawn { select(token.cancelled, stream.next) }
//!           └─ no runtime         ──► sink.on_no_runtime()
//! ```
//!
//! ## Rules
//! - Already-ready streams (immediate values, `stream::iter`) are handled
//!   entirely inside the caller, without a runtime.
//! - Cancellation of `token` stops delivery silently: no further item, no
//!   completion callback.
//! - Completion is reported **at most once**.

use futures::{FutureExt, Stream, StreamExt};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Whether the driver keeps pulling after an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Receiver side of [`drive`].
pub(crate) trait Drive<T>: Send + 'static {
    /// Handles one item.
    fn on_item(&mut self, item: T) -> Flow;

    /// The stream ended (or `on_item` returned [`Flow::Stop`]).
    fn on_complete(&mut self);

    /// The stream is pending and there is no runtime to keep polling it.
    fn on_no_runtime(&mut self);
}

/// Pumps `stream` into `sink` until it ends, the sink stops, or `token` is cancelled.
pub(crate) fn drive<S, D>(mut stream: S, token: CancellationToken, mut sink: D)
where
    S: Stream + Unpin + Send + 'static,
    S::Item: Send,
    D: Drive<S::Item>,
{
    loop {
        if token.is_cancelled() {
            return;
        }
        match stream.next().now_or_never() {
            Some(Some(item)) => {
                if sink.on_item(item) == Flow::Stop {
                    sink.on_complete();
                    return;
                }
            }
            Some(None) => {
                sink.on_complete();
                return;
            }
            None => break,
        }
    }

    let Ok(handle) = Handle::try_current() else {
        sink.on_no_runtime();
        return;
    };

    handle.spawn(async move {
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                next = stream.next() => next,
            };
            match next {
                Some(item) => {
                    if token.is_cancelled() {
                        return;
                    }
                    if sink.on_item(item) == Flow::Stop {
                        sink.on_complete();
                        return;
                    }
                }
                None => {
                    sink.on_complete();
                    return;
                }
            }
        }
    });
}
