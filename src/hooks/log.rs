//! # LogWriter: tracing-backed hooks
//!
//! A minimal [`CommandHooks`] implementation that forwards records to `tracing`.
//! Use it for demos or as a starting point.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  command="login" param=Some("bob") data=Some(true) executing=false result
//! WARN  command="login" param=Some("eve") error=action failed: denied exception
//! ```

use tracing::{info, warn};

use super::CommandHooks;
use crate::records::{DebugFailure, DebugResult};

/// Hooks that log every result and exception.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandHooks for LogWriter {
    fn on_exception(&self, debug_name: Option<&str>, failure: &DebugFailure<'_>) {
        warn!(
            command = debug_name.unwrap_or("unnamed"),
            param = ?failure.param,
            error = %failure.error,
            "exception"
        );
    }

    fn on_result(&self, debug_name: Option<&str>, result: &DebugResult<'_>) {
        match &result.error {
            Some(error) => info!(
                command = debug_name.unwrap_or("unnamed"),
                param = ?result.param,
                error = %error,
                "result"
            ),
            None => info!(
                command = debug_name.unwrap_or("unnamed"),
                param = ?result.param,
                data = ?result.data,
                executing = result.is_executing,
                "result"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
