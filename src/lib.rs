//! # rxcommand
//!
//! **rxcommand** wraps an action (a plain function, a future or a stream) in a
//! single-flight [`Command`] that publishes its lifecycle as observable streams.
//!
//! It is meant for UI-ish and service code that wants to bind "is this running?",
//! "may I press it again?" and "what went wrong?" to a single object instead of
//! hand-rolled flags.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      restriction: Stream<bool> (optional)
//!                 │
//!                 ▼
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Command<P, R>                                                     │
//! │  - gate (distinct bool) + single-flight guard                      │
//! │  - last_result                                                     │
//! │  - hooks (injected, or process-wide default captured at build)     │
//! └──────┬─────────────────────────────────────────────────────────────┘
//!        │ execute(p)
//!        ▼
//! ┌──────────────────────┐     ┌───────────────────────────────────────┐
//! │ adapter::normalize   │────►│ runner::drive                         │
//! │ Immediate / Deferred │     │ ready items: inline, caller's stack   │
//! │ / Multi + panics     │     │ pending: spawned on current runtime   │
//! └──────────────────────┘     └───────────────────┬───────────────────┘
//!                                                  ▼
//!        results ─ status ─ is_executing ─ can_execute ─ failures
//!                                                  │
//!                                                  ▼
//!                                   Collector (failure sink, bulk dispose)
//! ```
//!
//! ### Lifecycle of one attempt
//! ```text
//! execute(p)
//!   ├─► rejected (disposed / running / gate closed) ─► no-op
//!   └─► accepted:
//!         ├─► can_execute ◄── false
//!         ├─► status      ◄── running record
//!         ├─► per value:  results ◄── v, status ◄── data record
//!         ├─► on error:   status ◄── error record, failures ◄── ⟨p, e⟩
//!         └─► on end:     can_execute ◄── gate_open
//! ```
//!
//! ## Features
//! | Area           | Description                                                | Key types / traits                        |
//! |----------------|------------------------------------------------------------|-------------------------------------------|
//! | **Commands**   | Single-flight execution with gate and lifecycle streams.   | [`Command`], [`CommandBuilder`]           |
//! | **Actions**    | Sync, fallible, async and streaming handlers.              | [`ActionOutput`], [`ActionRef`]           |
//! | **Streams**    | Multicast subjects with replay-one and callbacks.          | [`Observable`], [`Observed`], [`Subscription`] |
//! | **Records**    | Status snapshots and failure pairs.                        | [`CommandResult`], [`CommandFailure`]     |
//! | **Hooks**      | Observe every command's results and exceptions.            | [`CommandHooks`], [`set_global_hooks`]    |
//! | **Collector**  | Bulk teardown and failure forwarding.                      | [`Collector`]                             |
//! | **Errors**     | Typed action errors.                                       | [`ActionError`]                           |
//! | **Config**     | Per-command flags.                                         | [`CommandConfig`]                         |
//!
//! ## Optional features
//! - `logging`: exports a simple `tracing`-backed [`LogWriter`] hooks implementation.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use rxcommand::{ActionError, Command};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let login = Command::future(|user: String| async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         if user == "eve" {
//!             Err(ActionError::fail("denied"))
//!         } else {
//!             Ok(format!("welcome {user}"))
//!         }
//!     });
//!
//!     let next = login.next();
//!     login.execute("bob".into());
//!     assert!(!login.can_execute_now());
//!     assert_eq!(next.await.unwrap(), "welcome bob");
//!
//!     login.dispose();
//! }
//! ```
mod actions;
mod collector;
mod core;
mod error;
mod events;
mod hooks;
mod records;

// ---- Public re-exports ----

pub use actions::{ActionOutput, ActionRef};
pub use collector::{
    Collector, FailureSink, ManagedCommand, Reference, listen_to_command_exceptions,
    set_listen_to_command_exceptions,
};
pub use core::{Command, CommandBuilder, CommandConfig, CommandValue};
pub use error::ActionError;
pub use events::{Observable, Observed, Subject, Subscription};
pub use hooks::{CommandHooks, clear_global_hooks, global_hooks, set_global_hooks};
pub use records::{CommandFailure, CommandResult, DebugFailure, DebugResult};

// Optional: expose a simple built-in hooks implementation (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use hooks::LogWriter;
