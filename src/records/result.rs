//! # Status record of a command attempt.
//!
//! A [`CommandResult`] is pushed on a command's `status` stream at every
//! lifecycle transition:
//!
//! ```text
//! construction (optional)  ⟨None,  last?, None,  false⟩   baseline
//! execute(p) accepted      ⟨Some(p), last?, None,  true ⟩   running
//! action yields v          ⟨Some(p), v,     None,  false⟩   data
//! action fails with e      ⟨Some(p), last?, Some(e), false⟩ error
//! ```
//!
//! `last?` is the command's last result when `emit_last_result` is enabled,
//! otherwise `None`.

use std::fmt;

use crate::error::ActionError;

/// Immutable snapshot of one point in an attempt's lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandResult<P, R> {
    /// Parameter of the attempt (`None` for the baseline record).
    pub param: Option<P>,
    /// Produced (or carried) value.
    pub data: Option<R>,
    /// Failure of the attempt.
    pub error: Option<ActionError>,
    /// True only for the record pushed when an attempt starts.
    pub is_executing: bool,
}

/// Type-erased view of a [`CommandResult`], handed to hooks.
pub type DebugResult<'a> = CommandResult<&'a dyn fmt::Debug, &'a dyn fmt::Debug>;

impl<P, R> CommandResult<P, R> {
    /// Creates a record from its parts.
    pub fn new(
        param: Option<P>,
        data: Option<R>,
        error: Option<ActionError>,
        is_executing: bool,
    ) -> Self {
        Self {
            param,
            data,
            error,
            is_executing,
        }
    }

    /// A data record: `⟨param, data, None, false⟩`.
    pub fn data(param: Option<P>, data: R) -> Self {
        Self::new(param, Some(data), None, false)
    }

    /// An error record: `⟨param, None, error, false⟩`.
    pub fn error(param: Option<P>, error: ActionError) -> Self {
        Self::new(param, None, Some(error), false)
    }

    /// A running record: `⟨param, None, None, true⟩`.
    pub fn loading(param: Option<P>) -> Self {
        Self::new(param, None, None, true)
    }

    /// The empty baseline: `⟨None, None, None, false⟩`.
    pub fn blank() -> Self {
        Self::new(None, None, None, false)
    }

    /// True if the record carries a value.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// True if the record carries an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<P: fmt::Debug, R: fmt::Debug> CommandResult<P, R> {
    /// Borrows the record as a [`DebugResult`].
    pub fn as_debug(&self) -> DebugResult<'_> {
        CommandResult {
            param: self.param.as_ref().map(|p| p as &dyn fmt::Debug),
            data: self.data.as_ref().map(|d| d as &dyn fmt::Debug),
            error: self.error.clone(),
            is_executing: self.is_executing,
        }
    }
}

impl<P: fmt::Debug, R: fmt::Debug> fmt::Display for CommandResult<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParamData {:?} - Data {:?} - HasError - {} - IsExecuting - {}",
            self.param,
            self.data,
            self.has_error(),
            self.is_executing
        )
    }
}
