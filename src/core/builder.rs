use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use tracing::debug;

use super::command::{Command, CommandValue, Inner};
use super::config::CommandConfig;
use crate::actions::{self, ActionOutput, ActionRef};
use crate::error::ActionError;
use crate::hooks::{self, CommandHooks};

pub(crate) type Restriction = BoxStream<'static, Result<bool, ActionError>>;

/// Builder for constructing a [`Command`] with optional features.
///
/// ## Example
/// ```
/// use rxcommand::CommandBuilder;
///
/// let cmd = CommandBuilder::sync(|n: u32| n + 1)
///     .with_debug_name("increment")
///     .with_last_result(true)
///     .with_initial_result(0)
///     .build();
///
/// cmd.execute(41);
/// assert_eq!(cmd.last_result(), Some(42));
/// ```
pub struct CommandBuilder<P, R> {
    action: ActionRef<P, R>,
    config: CommandConfig,
    restriction: Option<Restriction>,
    initial_last_result: Option<R>,
    hooks: Option<Arc<dyn CommandHooks>>,
}

impl<P: CommandValue, R: CommandValue> CommandBuilder<P, R> {
    /// Creates a builder around a raw handler returning [`ActionOutput`].
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(P) -> ActionOutput<R> + Send + Sync + 'static,
    {
        Self::from_action(Arc::new(action))
    }

    /// Creates a builder around an existing shared handler.
    pub fn from_action(action: ActionRef<P, R>) -> Self {
        Self {
            action,
            config: CommandConfig::default(),
            restriction: None,
            initial_last_result: None,
            hooks: None,
        }
    }

    /// Handler `P -> R` that always succeeds.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(P) -> R + Send + Sync + 'static,
    {
        Self::from_action(actions::from_sync(f))
    }

    /// Handler `P -> Result<R, E>`.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        E: Into<ActionError>,
    {
        Self::from_action(actions::from_fallible(f))
    }

    /// Handler `P -> impl Future<Output = Result<R, E>>`.
    pub fn future<F, Fut, E>(f: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        Self::from_action(actions::from_future(f))
    }

    /// Handler `P -> impl Stream<Item = Result<R, E>>`.
    pub fn stream<F, S, E>(f: F) -> Self
    where
        F: Fn(P) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        Self::from_action(actions::from_stream(f))
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: CommandConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the label passed to hooks and logs.
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.config.debug_name = Some(name.into());
        self
    }

    /// Push a baseline status record at construction.
    pub fn with_initial_command_result(mut self, enabled: bool) -> Self {
        self.config.emit_initial_command_result = enabled;
        self
    }

    /// Carry the last result into running and error status records.
    pub fn with_last_result(mut self, enabled: bool) -> Self {
        self.config.emit_last_result = enabled;
        self
    }

    /// Replay the latest `results`/`status` item to late subscribers.
    pub fn with_replay(mut self, enabled: bool) -> Self {
        self.config.emits_last_value_to_new_subscriptions = enabled;
        self
    }

    /// Seeds `last_result` before the first attempt.
    pub fn with_initial_result(mut self, value: R) -> Self {
        self.initial_last_result = Some(value);
        self
    }

    /// Gates execution on a boolean stream.
    pub fn with_restriction<S>(mut self, restriction: S) -> Self
    where
        S: Stream<Item = bool> + Send + 'static,
    {
        self.restriction = Some(restriction.map(Ok).boxed());
        self
    }

    /// Gates execution on a fallible boolean stream; errors become failures.
    pub fn with_fallible_restriction<S, E>(mut self, restriction: S) -> Self
    where
        S: Stream<Item = Result<bool, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        self.restriction = Some(
            restriction
                .map_err(|e| {
                    let error: ActionError = e.into();
                    match error {
                        ActionError::Fail { error } => ActionError::Restriction { error },
                        other => other,
                    }
                })
                .boxed(),
        );
        self
    }

    /// Injects hooks for this command instead of the global default.
    pub fn with_hooks(mut self, hooks: Arc<dyn CommandHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Builds the command.
    ///
    /// Without explicit hooks the process-wide default
    /// ([`set_global_hooks`](crate::set_global_hooks)) is captured here.
    ///
    /// A restriction stream that is not ready right away is polled on the
    /// current tokio runtime.
    pub fn build(self) -> Command<P, R> {
        let hooks = self.hooks.or_else(hooks::global_hooks);
        if let Some(hooks) = &hooks {
            debug!(
                command = self.config.debug_name.as_deref().unwrap_or("unnamed"),
                hooks = hooks.name(),
                "hooks attached"
            );
        }
        let inner = Inner::new(self.action, self.config, hooks, self.initial_last_result);
        Command::start(inner, self.restriction)
    }
}

impl<P: CommandValue, R: CommandValue> Command<P, R> {
    /// Shorthand for [`CommandBuilder::new`].
    pub fn builder<F>(action: F) -> CommandBuilder<P, R>
    where
        F: Fn(P) -> ActionOutput<R> + Send + Sync + 'static,
    {
        CommandBuilder::new(action)
    }

    /// A command around `P -> R`, default configuration.
    ///
    /// ```
    /// use rxcommand::Command;
    ///
    /// let cmd = Command::new(|p: String| format!("RESULT + {p}"));
    /// let mut results = cmd.results().subscribe();
    /// cmd.execute("Test".into());
    /// assert_eq!(results.drain(), vec!["RESULT + Test".to_string()]);
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(P) -> R + Send + Sync + 'static,
    {
        CommandBuilder::sync(f).build()
    }

    /// A command around `P -> Result<R, E>`, default configuration.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        E: Into<ActionError>,
    {
        CommandBuilder::fallible(f).build()
    }

    /// A command around an async handler, default configuration.
    pub fn future<F, Fut, E>(f: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        CommandBuilder::future(f).build()
    }

    /// A command around a stream-producing handler, default configuration.
    pub fn stream<F, S, E>(f: F) -> Self
    where
        F: Fn(P) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<R, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        CommandBuilder::stream(f).build()
    }
}
