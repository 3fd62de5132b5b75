use std::fmt;

use crate::error::ActionError;

/// Pairs the parameter that was in flight with the error that occurred.
///
/// Emitted on a command's `failures` stream for every error-bearing status
/// record, and for restriction stream errors (with `param = None`).
#[derive(Clone, Debug, PartialEq)]
pub struct CommandFailure<P> {
    /// Parameter of the failed attempt, `None` for restriction failures.
    pub param: Option<P>,
    /// What went wrong.
    pub error: ActionError,
}

/// Type-erased view of a [`CommandFailure`], handed to hooks and collector sinks.
pub type DebugFailure<'a> = CommandFailure<&'a dyn fmt::Debug>;

impl<P> CommandFailure<P> {
    /// Creates a failure record.
    pub fn new(param: Option<P>, error: ActionError) -> Self {
        Self { param, error }
    }
}

impl<P: fmt::Debug> CommandFailure<P> {
    /// Borrows the record as a [`DebugFailure`].
    pub fn as_debug(&self) -> DebugFailure<'_> {
        CommandFailure {
            param: self.param.as_ref().map(|p| p as &dyn fmt::Debug),
            error: self.error.clone(),
        }
    }
}

impl<P: fmt::Debug> fmt::Display for CommandFailure<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - for param: {:?}", self.error, self.param)
    }
}
