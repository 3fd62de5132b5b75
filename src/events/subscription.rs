//! # Cancellable subscription handle.
//!
//! A [`Subscription`] represents one attachment to an event source: a
//! callback registered with [`Observable::observe`](crate::Observable::observe),
//! or a background task started by [`Subscription::spawn`].
//!
//! Internally it is a [`CancellationToken`]; cloning a subscription yields a
//! second handle to the **same** attachment.
//!
//! ## Rules
//! - `cancel()` is idempotent.
//! - A cancelled callback is never invoked again, even if an emission is
//!   already in progress on another thread.
//! - Dropping a handle does **not** cancel it; ownership of teardown is
//!   explicit (see [`Collector`](crate::Collector)).

use futures::{Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Handle to an active attachment that can be cancelled.
#[derive(Clone, Debug, Default)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    /// Creates a fresh, active subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a subscription that is already cancelled.
    pub(crate) fn closed() -> Self {
        let sub = Self::new();
        sub.cancel();
        sub
    }

    /// Drives `stream` on the current tokio runtime, calling `f` for every item,
    /// until the stream ends or the returned subscription is cancelled.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime (see [`tokio::spawn`]).
    ///
    /// # Example
    /// ```
    /// use rxcommand::{Subject, Subscription};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let subject = Subject::<u32>::publish();
    /// let sub = Subscription::spawn(subject.observable().subscribe(), |n| println!("{n}"));
    /// subject.next(1);
    /// sub.cancel();
    /// # }
    /// ```
    pub fn spawn<S, F>(stream: S, mut f: F) -> Subscription
    where
        S: Stream + Send + 'static,
        S::Item: Send,
        F: FnMut(S::Item) + Send + 'static,
    {
        let sub = Subscription::new();
        let token = sub.token.clone();

        tokio::spawn(async move {
            let mut stream = std::pin::pin!(stream);
            loop {
                let item = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    item = stream.next() => item,
                };
                match item {
                    Some(item) => f(item),
                    None => return,
                }
            }
        });
        sub
    }

    /// Cancels the attachment. Safe to call multiple times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the subscription is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Subject;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent() {
        let sub = Subscription::new();
        let twin = sub.clone();
        assert!(!sub.is_cancelled());

        sub.cancel();
        sub.cancel();
        assert!(twin.is_cancelled());
        assert!(Subscription::closed().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_stops_after_cancel() {
        let subject = Subject::<u32>::publish();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let sub = Subscription::spawn(subject.observable().subscribe(), move |n| {
            counter.fetch_add(n as usize, Ordering::SeqCst);
        });

        subject.next(2);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        sub.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        subject.next(5);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
