//! # Collector: bulk ownership of commands and subscriptions.
//!
//! A [`Collector`] takes ownership of [`Command`]s and raw [`Subscription`]s and
//! tears all of them down with one [`dispose`](Collector::dispose) call.
//! Every command handed over also gets its `failures` stream forwarded to the
//! collector's sink.
//!
//! ## Architecture
//! ```text
//! add([..])
//!   ├─► Reference::Subscription(s) ──► subscriptions.push(s)
//!   └─► Reference::Command(c)      ──► commands.push(c)
//!                                     └─► c.failures().observe(..) ──► subscriptions.push(..)
//!                                              │
//!                          listen_to_command_exceptions()? ──► sink(debug_name, failure)
//!
//! dispose()
//!   ├─► cancel every subscription
//!   ├─► dispose every command
//!   └─► clear both lists (collector is reusable)
//! ```
//!
//! ## Rules
//! - Forwarding happens inline, on the thread that produced the failure.
//! - The switch is read per failure, so toggling it affects commands that
//!   were already added.
//! - `dispose` is idempotent.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::core::{Command, CommandValue};
use crate::events::Subscription;
use crate::records::DebugFailure;

static LISTEN_TO_COMMAND_EXCEPTIONS: AtomicBool = AtomicBool::new(true);

/// Enables or disables failure forwarding for every collector in the process.
pub fn set_listen_to_command_exceptions(enabled: bool) {
    LISTEN_TO_COMMAND_EXCEPTIONS.store(enabled, Ordering::Relaxed);
}

/// Current value of the process-wide forwarding switch (default `true`).
pub fn listen_to_command_exceptions() -> bool {
    LISTEN_TO_COMMAND_EXCEPTIONS.load(Ordering::Relaxed)
}

/// Receives forwarded failures: `(debug_name, failure)`.
pub type FailureSink = Arc<dyn Fn(Option<&str>, &DebugFailure<'_>) + Send + Sync>;

/// Something a [`Collector`] can own.
pub enum Reference {
    /// A raw subscription, cancelled on dispose.
    Subscription(Subscription),
    /// A command, disposed on dispose.
    Command(Box<dyn ManagedCommand>),
}

/// Object-safe view of a [`Command`] of any parameter/result types.
pub trait ManagedCommand: Send + Sync + 'static {
    /// Forwards every failure of the command to `sink` while the process-wide
    /// switch is on.
    fn forward_failures(&self, sink: FailureSink) -> Subscription;

    /// Disposes the command.
    fn dispose(&self);
}

impl<P: CommandValue, R: CommandValue> ManagedCommand for Command<P, R> {
    fn forward_failures(&self, sink: FailureSink) -> Subscription {
        let name = self.debug_name().map(str::to_owned);
        self.failures().observe(move |failure| {
            if listen_to_command_exceptions() {
                sink(name.as_deref(), &failure.as_debug());
            }
        })
    }

    fn dispose(&self) {
        Command::dispose(self);
    }
}

impl From<Subscription> for Reference {
    fn from(sub: Subscription) -> Self {
        Reference::Subscription(sub)
    }
}

impl<P: CommandValue, R: CommandValue> From<Command<P, R>> for Reference {
    fn from(cmd: Command<P, R>) -> Self {
        Reference::Command(Box::new(cmd))
    }
}

impl<P: CommandValue, R: CommandValue> From<&Command<P, R>> for Reference {
    fn from(cmd: &Command<P, R>) -> Self {
        Reference::Command(Box::new(cmd.clone()))
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Subscription(sub) => f.debug_tuple("Subscription").field(sub).finish(),
            Reference::Command(_) => f.write_str("Command(..)"),
        }
    }
}

#[derive(Default)]
struct Owned {
    subscriptions: Vec<Subscription>,
    commands: Vec<Box<dyn ManagedCommand>>,
}

/// Owns commands and subscriptions for bulk teardown.
///
/// ## Example
/// ```
/// use rxcommand::{Collector, Command};
///
/// let collector = Collector::new();
/// let cmd = Command::new(|n: u32| n * 2);
/// collector.sink(&cmd);
///
/// collector.dispose();
/// assert!(cmd.is_disposed());
/// assert!(collector.is_empty());
/// ```
pub struct Collector {
    owned: Mutex<Owned>,
    sink: FailureSink,
}

impl Collector {
    /// Creates a collector whose sink logs failures with `tracing::error!`.
    pub fn new() -> Self {
        Self::with_sink(|debug_name, failure| {
            error!(
                command = debug_name.unwrap_or("unnamed"),
                param = ?failure.param,
                error = %failure.error,
                "command failed"
            );
        })
    }

    /// Creates a collector with a custom failure sink.
    pub fn with_sink<F>(sink: F) -> Self
    where
        F: Fn(Option<&str>, &DebugFailure<'_>) + Send + Sync + 'static,
    {
        Self {
            owned: Mutex::new(Owned::default()),
            sink: Arc::new(sink),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Owned> {
        self.owned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes ownership of every item.
    pub fn add<I>(&self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<Reference>,
    {
        for item in items {
            self.sink(item);
        }
    }

    /// Takes ownership of one item.
    pub fn sink(&self, item: impl Into<Reference>) {
        match item.into() {
            Reference::Subscription(sub) => self.lock().subscriptions.push(sub),
            Reference::Command(cmd) => {
                let forwarding = cmd.forward_failures(Arc::clone(&self.sink));
                let mut owned = self.lock();
                owned.subscriptions.push(forwarding);
                owned.commands.push(cmd);
            }
        }
    }

    /// Cancels every subscription, disposes every command, then forgets both.
    ///
    /// Safe to call repeatedly; the collector can be reused afterwards.
    pub fn dispose(&self) {
        let Owned {
            subscriptions,
            commands,
        } = std::mem::take(&mut *self.lock());

        if subscriptions.is_empty() && commands.is_empty() {
            return;
        }
        debug!(
            subscriptions = subscriptions.len(),
            commands = commands.len(),
            "collector disposing"
        );

        for sub in &subscriptions {
            sub.cancel();
        }
        for cmd in &commands {
            cmd.dispose();
        }
    }

    /// Number of owned subscriptions, including failure forwarders.
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Number of owned commands.
    pub fn command_count(&self) -> usize {
        self.lock().commands.len()
    }

    /// Total number of owned items.
    pub fn len(&self) -> usize {
        let owned = self.lock();
        owned.subscriptions.len() + owned.commands.len()
    }

    /// True when nothing is owned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owned = self.lock();
        f.debug_struct("Collector")
            .field("subscriptions", &owned.subscriptions.len())
            .field("commands", &owned.commands.len())
            .finish_non_exhaustive()
    }
}
