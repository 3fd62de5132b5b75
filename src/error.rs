//! Error types used by commands and their actions.
//!
//! [`ActionError`] is the single error type that flows through a command:
//! it is produced by the wrapped action, by a failing restriction stream,
//! or by the engine itself when an attempt cannot be driven.
//!
//! Like the rest of the records it is cheap to clone, because every error is
//! fanned out to several subscribers (status, failures, hooks).

use std::error::Error as StdError;

use thiserror::Error;

/// # Errors surfaced by a command.
///
/// Every variant ends up inside a [`CommandResult`](crate::CommandResult) and a
/// [`CommandFailure`](crate::CommandFailure); nothing here is ever re-thrown.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The wrapped action failed.
    #[error("action failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The restriction (gate) stream yielded an error item.
    #[error("restriction failed: {error}")]
    Restriction {
        /// The underlying error message.
        error: String,
    },

    /// The action needed an async runtime to make progress and none was available.
    #[error("no async runtime available to drive the action")]
    NoRuntime,

    /// The command was disposed before an outcome was produced.
    #[error("command disposed")]
    Disposed,
}

impl ActionError {
    /// Builds a [`ActionError::Fail`] from any message.
    pub fn fail(error: impl Into<String>) -> Self {
        ActionError::Fail {
            error: error.into(),
        }
    }

    /// Builds a [`ActionError::Restriction`] from any message.
    pub fn restriction(error: impl Into<String>) -> Self {
        ActionError::Restriction {
            error: error.into(),
        }
    }

    /// Captures a foreign error (and its source chain) as a [`ActionError::Fail`].
    ///
    /// # Example
    /// ```
    /// use rxcommand::ActionError;
    ///
    /// let io = std::io::Error::other("disk gone");
    /// let err = ActionError::from_error(&io);
    /// assert_eq!(err, ActionError::fail("disk gone"));
    /// ```
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ActionError::Fail { error: message }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use rxcommand::ActionError;
    ///
    /// assert_eq!(ActionError::fail("boom").as_label(), "action_failed");
    /// assert_eq!(ActionError::Disposed.as_label(), "command_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Fail { .. } => "action_failed",
            ActionError::Restriction { .. } => "restriction_failed",
            ActionError::NoRuntime => "no_runtime",
            ActionError::Disposed => "command_disposed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Fail { error } => format!("error: {error}"),
            ActionError::Restriction { error } => format!("restriction: {error}"),
            ActionError::NoRuntime => "no runtime".to_string(),
            ActionError::Disposed => "disposed".to_string(),
        }
    }

    /// True when the error originates from the restriction stream rather than an attempt.
    pub fn is_restriction(&self) -> bool {
        matches!(self, ActionError::Restriction { .. })
    }
}

impl From<String> for ActionError {
    fn from(error: String) -> Self {
        ActionError::Fail { error }
    }
}

impl From<&str> for ActionError {
    fn from(error: &str) -> Self {
        ActionError::fail(error)
    }
}

impl From<std::io::Error> for ActionError {
    fn from(error: std::io::Error) -> Self {
        ActionError::from_error(&error)
    }
}
