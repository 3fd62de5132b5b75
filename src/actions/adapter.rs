//! # Action adapter: one stream shape for every action.
//!
//! [`normalize`] invokes the handler and turns whatever it returned into a
//! single stream of `Result<R, ActionError>`:
//!
//! ```text
//! Immediate(res) ──► once(res)                 (ends synchronously)
//! Deferred(fut)  ──► fut.into_stream()         (one item, then ends)
//! Multi(stream)  ──► stream                    (passed through)
//! ```
//!
//! ## Panic containment
//! A panic raised while invoking the handler, or while polling the returned
//! future/stream, is caught here. The panic payload is logged with
//! `tracing::warn!` and the normalized stream simply **ends**: nothing is
//! forwarded to the command's streams and the attempt completes normally.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::future;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};
use tracing::{debug, warn};

use super::output::{ActionOutput, ActionRef};
use crate::error::ActionError;

/// Normalized result stream of a single attempt.
pub(crate) type Normalized<R> = BoxStream<'static, Result<R, ActionError>>;

/// Invokes `action` with `param` and adapts its output into a [`Normalized`] stream.
pub(crate) fn normalize<P, R>(
    action: &ActionRef<P, R>,
    param: P,
    name: Option<&str>,
) -> Normalized<R>
where
    R: Send + 'static,
{
    let output = match catch_unwind(AssertUnwindSafe(|| action(param))) {
        Ok(output) => output,
        Err(panic) => {
            warn!(
                command = name.unwrap_or("unnamed"),
                panic = %panic_message(&*panic),
                "action panicked; dropping"
            );
            return stream::empty().boxed();
        }
    };

    debug!(
        command = name.unwrap_or("unnamed"),
        kind = output.kind(),
        "action invoked"
    );

    let name = name.map(str::to_owned);
    match output {
        ActionOutput::Immediate(res) => stream::once(future::ready(res)).boxed(),
        ActionOutput::Deferred(fut) => contain(fut.into_stream(), name),
        ActionOutput::Multi(stream) => contain(stream, name),
    }
}

/// Ends the stream (after logging) at the first panic raised while polling it.
fn contain<R, S>(stream: S, name: Option<String>) -> Normalized<R>
where
    R: Send + 'static,
    S: futures::Stream<Item = Result<R, ActionError>> + Send + 'static,
{
    AssertUnwindSafe(stream)
        .catch_unwind()
        .scan((), move |_, item| {
            future::ready(match item {
                Ok(item) => Some(item),
                Err(panic) => {
                    warn!(
                        command = name.as_deref().unwrap_or("unnamed"),
                        panic = %panic_message(&*panic),
                        "action panicked while running; dropping"
                    );
                    None
                }
            })
        })
        .boxed()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
