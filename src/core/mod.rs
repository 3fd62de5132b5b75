//! Command core: execution engine and lifecycle.
//!
//! The public API from this module is [`Command`] (the engine handle),
//! [`CommandBuilder`] and [`CommandConfig`].
//!
//! Internal modules:
//! - [`command`]: single-flight guard, gate and stream publication;
//! - [`builder`]: fluent construction, hooks resolution;
//! - [`config`]: plain configuration flags;
//! - [`runner`]: drives attempt and restriction streams (sync drain, then spawn).

mod builder;
mod command;
mod config;
mod runner;

pub use builder::CommandBuilder;
pub use command::{Command, CommandValue};
pub use config::CommandConfig;
