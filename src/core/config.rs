//! # Per-command configuration.
//!
//! Provides [`CommandConfig`], the plain flags that shape how a command
//! publishes its records. Everything that is not a plain value (restriction
//! stream, hooks, seed result) is supplied through the
//! [`CommandBuilder`](crate::CommandBuilder).
//!
//! ## Implied settings
//! - `emit_initial_command_result = true` implies replay-one on `results` and
//!   `status`, otherwise the baseline record would be lost before anyone could
//!   subscribe.

/// Configuration flags for a single command.
///
/// ## Field semantics
/// - `emit_initial_command_result`: push `⟨None, initial, None, false⟩` at construction
/// - `emit_last_result`: carry the last result into running/error records
/// - `emits_last_value_to_new_subscriptions`: replay-one on `results`/`status`
/// - `debug_name`: opaque label passed to hooks and logs
///
/// ## Example
/// ```
/// use rxcommand::CommandConfig;
///
/// let mut cfg = CommandConfig::default();
/// cfg.emit_initial_command_result = true;
/// cfg.debug_name = Some("login".into());
///
/// assert!(cfg.replays_to_new_subscriptions());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandConfig {
    /// Push a baseline status record at construction.
    pub emit_initial_command_result: bool,
    /// Carry `last_result` forward into running and error status records.
    pub emit_last_result: bool,
    /// Replay the latest `results`/`status` item to late subscribers.
    pub emits_last_value_to_new_subscriptions: bool,
    /// Label passed to hooks and used in log fields.
    pub debug_name: Option<String>,
}

impl CommandConfig {
    /// True when `results`/`status` should replay their latest item.
    pub fn replays_to_new_subscriptions(&self) -> bool {
        self.emits_last_value_to_new_subscriptions || self.emit_initial_command_result
    }

    /// Returns a config with `debug_name` set.
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }
}
