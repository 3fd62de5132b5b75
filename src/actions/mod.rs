//! # Actions: the unit of work behind a command.
//!
//! - [`ActionOutput`]: closed tagged union of handler return shapes
//! - [`ActionRef`]: shared handler `Arc<dyn Fn(P) -> ActionOutput<R>>`
//! - `adapter::normalize`: turns any output into one result stream

pub(crate) mod adapter;
mod output;

pub use output::{ActionOutput, ActionRef};
pub(crate) use output::{from_fallible, from_future, from_stream, from_sync};
