//! Event plumbing shared by every command.
//!
//! Commands publish their lifecycle through [`Subject`]s and hand out the read
//! side as [`Observable`]s. Consumers either attach an async [`Observed`]
//! stream or a synchronous callback, and get back a [`Subscription`] they can
//! cancel (or hand to a [`Collector`](crate::Collector)).
//!
//! ## Contents
//! - [`Subject`], [`Observable`], [`Observed`]: multicast push source with optional replay-one
//! - [`Subscription`]: cancellable attachment handle

mod subject;
mod subscription;

pub use subject::{Observable, Observed, Subject};
pub use subscription::Subscription;
