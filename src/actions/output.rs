//! # What an action hands back.
//!
//! A command wraps a handler `Fn(P) -> ActionOutput<R>`. The handler's return
//! shape is classified once, at the call site, into one of three variants:
//!
//! | Variant     | Produces                         | Completes                   |
//! |-------------|----------------------------------|-----------------------------|
//! | `Immediate` | one value (or error), right away | synchronously               |
//! | `Deferred`  | one value (or error), later      | when the future resolves    |
//! | `Multi`     | zero or more values              | when the stream ends/fails  |
//!
//! The shorthand constructors on [`CommandBuilder`](crate::CommandBuilder)
//! (`sync`, `fallible`, `future`, `stream`) wrap plain closures into the
//! matching variant so callers rarely build an `ActionOutput` by hand.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt, TryFutureExt, TryStreamExt};

use crate::error::ActionError;

/// Shared handler behind a command.
pub type ActionRef<P, R> = Arc<dyn Fn(P) -> ActionOutput<R> + Send + Sync>;

/// Closed set of action return shapes.
pub enum ActionOutput<R> {
    /// Already computed.
    Immediate(Result<R, ActionError>),
    /// Resolves once, later.
    Deferred(BoxFuture<'static, Result<R, ActionError>>),
    /// Emits any number of values; an `Err` item ends the attempt.
    Multi(BoxStream<'static, Result<R, ActionError>>),
}

impl<R: Send + 'static> ActionOutput<R> {
    /// A successful immediate value.
    pub fn value(value: R) -> Self {
        ActionOutput::Immediate(Ok(value))
    }

    /// An immediate outcome.
    pub fn result<E: Into<ActionError>>(result: Result<R, E>) -> Self {
        ActionOutput::Immediate(result.map_err(Into::into))
    }

    /// A deferred outcome.
    pub fn deferred<F, E>(fut: F) -> Self
    where
        F: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        ActionOutput::Deferred(fut.map_err(Into::into).boxed())
    }

    /// A multi-value outcome.
    pub fn stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        ActionOutput::Multi(stream.map_err(Into::into).boxed())
    }

    /// Short label of the variant (for logs).
    pub fn kind(&self) -> &'static str {
        match self {
            ActionOutput::Immediate(_) => "immediate",
            ActionOutput::Deferred(_) => "deferred",
            ActionOutput::Multi(_) => "multi",
        }
    }
}

impl<R> fmt::Debug for ActionOutput<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutput::Immediate(res) => f
                .debug_tuple("Immediate")
                .field(&res.as_ref().map(|_| "..").map_err(|e| e.as_label()))
                .finish(),
            ActionOutput::Deferred(_) => f.write_str("Deferred(..)"),
            ActionOutput::Multi(_) => f.write_str("Multi(..)"),
        }
    }
}

/// Wraps `f: Fn(P) -> R` as an always-successful immediate action.
pub(crate) fn from_sync<P, R, F>(f: F) -> ActionRef<P, R>
where
    P: 'static,
    R: Send + 'static,
    F: Fn(P) -> R + Send + Sync + 'static,
{
    Arc::new(move |param: P| ActionOutput::value(f(param)))
}

/// Wraps `f: Fn(P) -> Result<R, E>` as an immediate action.
pub(crate) fn from_fallible<P, R, E, F>(f: F) -> ActionRef<P, R>
where
    P: 'static,
    R: Send + 'static,
    E: Into<ActionError>,
    F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
{
    Arc::new(move |param: P| ActionOutput::result(f(param)))
}

/// Wraps `f: Fn(P) -> impl Future<Output = Result<R, E>>` as a deferred action.
pub(crate) fn from_future<P, R, E, F, Fut>(f: F) -> ActionRef<P, R>
where
    P: 'static,
    R: Send + 'static,
    E: Into<ActionError> + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    Arc::new(move |param: P| ActionOutput::deferred(f(param)))
}

/// Wraps `f: Fn(P) -> impl Stream<Item = Result<R, E>>` as a multi-value action.
pub(crate) fn from_stream<P, R, E, F, S>(f: F) -> ActionRef<P, R>
where
    P: 'static,
    R: Send + 'static,
    E: Into<ActionError> + 'static,
    F: Fn(P) -> S + Send + Sync + 'static,
    S: Stream<Item = Result<R, E>> + Send + 'static,
{
    Arc::new(move |param: P| ActionOutput::stream(f(param)))
}
