//! # Command hooks: observe every command from one place.
//!
//! [`CommandHooks`] receives two kinds of notifications:
//! - `on_exception` for every action failure,
//! - `on_result` for every data or error status record.
//!
//! Hooks are injected per command through
//! [`CommandBuilder::with_hooks`](crate::CommandBuilder::with_hooks). A command
//! built without explicit hooks captures the process-wide default installed
//! with [`set_global_hooks`] (if any) at build time.
//!
//! ```text
//!   CommandBuilder::with_hooks(h) ───────┐
//!                                        ├──► Command ──► h.on_exception(..)
//!   set_global_hooks(h) ── (fallback) ───┘            └─► h.on_result(..)
//! ```
//!
//! Records are handed over type-erased ([`DebugResult`], [`DebugFailure`]) so
//! one hooks instance can serve commands of any parameter/result types.

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;

use std::sync::{Arc, PoisonError, RwLock};

use crate::records::{DebugFailure, DebugResult};

/// Contract for command-wide observers.
///
/// Both callbacks run inline on the thread that produced the record; keep
/// them cheap and non-blocking.
pub trait CommandHooks: Send + Sync + 'static {
    /// Called for every failure of a wrapped action.
    fn on_exception(&self, debug_name: Option<&str>, failure: &DebugFailure<'_>) {
        let _ = (debug_name, failure);
    }

    /// Called for every data or error status record.
    fn on_result(&self, debug_name: Option<&str>, result: &DebugResult<'_>) {
        let _ = (debug_name, result);
    }

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

static GLOBAL_HOOKS: RwLock<Option<Arc<dyn CommandHooks>>> = RwLock::new(None);

/// Installs the process-wide default hooks used by commands built afterwards.
pub fn set_global_hooks(hooks: Arc<dyn CommandHooks>) {
    *GLOBAL_HOOKS.write().unwrap_or_else(PoisonError::into_inner) = Some(hooks);
}

/// Removes the process-wide default hooks.
pub fn clear_global_hooks() {
    *GLOBAL_HOOKS.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Returns the process-wide default hooks, if any.
pub fn global_hooks() -> Option<Arc<dyn CommandHooks>> {
    GLOBAL_HOOKS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
