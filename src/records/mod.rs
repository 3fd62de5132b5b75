//! Immutable records published by commands.
//!
//! - [`CommandResult`]: status snapshot (param, data, error, running flag)
//! - [`CommandFailure`]: param/error pair for the failure stream

mod failure;
mod result;

pub use failure::{CommandFailure, DebugFailure};
pub use result::{CommandResult, DebugResult};
