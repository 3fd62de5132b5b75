//! # Subject: multicast push source for command events.
//!
//! [`Subject`] is the write side, [`Observable`] is the read side handed out to
//! consumers. Every published item is fanned out to two kinds of sinks:
//!
//! ```text
//!   next(item)
//!      │                      (clone per sink)
//!      ├───────────────► [unbounded queue] ─► Observed<T> (async Stream)
//!      ├───────────────► [unbounded queue] ─► Observed<T>
//!      └───────────────► callback(&item)     (inline, same call stack)
//! ```
//!
//! ## Modes
//! - [`Subject::publish`]: late subscribers only see items published after they attach.
//! - [`Subject::replay`]: the latest item is re-delivered to every new subscriber.
//! - [`Subject::behavior`]: like `replay`, seeded with an initial value.
//!
//! ## Rules
//! - `next()` never blocks on consumers; queued sinks are unbounded.
//! - Callbacks run **after** the internal lock is released, so a callback may
//!   publish to any subject (including this one).
//! - Per-sink FIFO; no ordering across different sinks.
//! - After `complete()` every queued stream ends (once drained) and further
//!   `next()` calls are ignored.
//! - Sinks whose receiver was dropped or whose subscription was cancelled are
//!   pruned lazily on the next emission.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::{FutureExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::Subscription;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

enum Sink<T> {
    Queue(mpsc::UnboundedSender<T>),
    Callback {
        token: CancellationToken,
        f: Callback<T>,
    },
}

impl<T> Sink<T> {
    fn is_live(&self) -> bool {
        match self {
            Sink::Queue(tx) => !tx.is_closed(),
            Sink::Callback { token, .. } => !token.is_cancelled(),
        }
    }
}

struct State<T> {
    sinks: Vec<Sink<T>>,
    latest: Option<T>,
    replay: bool,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write side of a multicast event source.
pub struct Subject<T> {
    shared: Arc<Shared<T>>,
}

/// Read side of a [`Subject`]; cheap to clone.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> Subject<T> {
    fn with_state(latest: Option<T>, replay: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    sinks: Vec::new(),
                    latest,
                    replay,
                    closed: false,
                }),
            }),
        }
    }

    /// Plain broadcast: late subscribers see nothing until the next emission.
    pub fn publish() -> Self {
        Self::with_state(None, false)
    }

    /// Replay-one: new subscribers immediately receive the latest item, if any.
    pub fn replay() -> Self {
        Self::with_state(None, true)
    }

    /// Replay-one seeded with `initial`.
    pub fn behavior(initial: T) -> Self {
        Self::with_state(Some(initial), true)
    }

    /// Returns a read-only handle.
    pub fn observable(&self) -> Observable<T> {
        Observable {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Publishes `item` to every live sink.
    ///
    /// Ignored once the subject is completed.
    pub fn next(&self, item: T) {
        let callbacks: Vec<(CancellationToken, Callback<T>)> = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            if state.replay {
                state.latest = Some(item.clone());
            }
            state.sinks.retain(|sink| match sink {
                Sink::Queue(tx) => tx.unbounded_send(item.clone()).is_ok(),
                Sink::Callback { token, .. } => !token.is_cancelled(),
            });
            state
                .sinks
                .iter()
                .filter_map(|sink| match sink {
                    Sink::Callback { token, f } => Some((token.clone(), Arc::clone(f))),
                    Sink::Queue(_) => None,
                })
                .collect()
        };

        for (token, f) in callbacks {
            if !token.is_cancelled() {
                f(&item);
            }
        }
    }

    /// Completes the subject: ends every queued stream and drops every callback.
    ///
    /// Idempotent.
    pub fn complete(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        for sink in state.sinks.drain(..) {
            if let Sink::Callback { token, .. } = sink {
                token.cancel();
            }
        }
    }

    /// True once [`complete`](Self::complete) was called.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// True if at least one live sink is attached.
    pub fn is_observed(&self) -> bool {
        self.observable().is_observed()
    }

    /// The latest replayable item (always `None` for [`Subject::publish`]).
    pub fn value(&self) -> Option<T> {
        self.shared.lock().latest.clone()
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    fn attach_queue(&self, replay: bool) -> Observed<T> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.shared.lock();

        if replay && state.replay {
            if let Some(latest) = &state.latest {
                let _ = tx.unbounded_send(latest.clone());
            }
        }
        if !state.closed {
            state.sinks.push(Sink::Queue(tx));
        }
        Observed { rx }
    }

    /// Attaches an async stream of items.
    ///
    /// Replaying subjects deliver their latest item first. The stream ends when
    /// the subject completes.
    pub fn subscribe(&self) -> Observed<T> {
        self.attach_queue(true)
    }

    /// Like [`subscribe`](Self::subscribe) but never replays: only items
    /// published after this call are delivered.
    pub fn subscribe_upcoming(&self) -> Observed<T> {
        self.attach_queue(false)
    }

    /// Registers a callback invoked inline for every published item.
    ///
    /// Replaying subjects invoke the callback once with their latest item before
    /// returning. On a completed subject the returned subscription is already
    /// cancelled.
    pub fn observe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f: Callback<T> = Arc::new(f);
        let (sub, replayed) = {
            let mut state = self.shared.lock();
            let replayed = if state.replay { state.latest.clone() } else { None };
            if state.closed {
                (Subscription::closed(), replayed)
            } else {
                let sub = Subscription::new();
                state.sinks.push(Sink::Callback {
                    token: sub.token().clone(),
                    f: Arc::clone(&f),
                });
                (sub, replayed)
            }
        };

        if let Some(item) = replayed {
            f(&item);
        }
        sub
    }

    /// True if at least one live sink is attached. Prunes dead sinks.
    pub fn is_observed(&self) -> bool {
        let mut state = self.shared.lock();
        state.sinks.retain(Sink::is_live);
        !state.sinks.is_empty()
    }

    /// True once the underlying subject completed.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Subject")
            .field("sinks", &state.sinks.len())
            .field("replay", &state.replay)
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

/// Async stream of items delivered by an [`Observable`].
///
/// Unbounded: items are buffered until polled.
pub struct Observed<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Observed<T> {
    /// Takes every item that is already buffered, without waiting.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(Some(item)) = self.rx.next().now_or_never() {
            items.push(item);
        }
        items
    }
}

impl<T> Stream for Observed<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rx.size_hint()
    }
}

impl<T> fmt::Debug for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed").finish_non_exhaustive()
    }
}
