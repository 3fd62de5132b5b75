//! # Command: single-flight execution engine.
//!
//! A [`Command`] wraps an action and publishes its lifecycle on five streams:
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!   execute(p) ──────► │ guard: !disposed && gate_open && !running     │── rejected ──► (no-op)
//!                      └──────────────────────┬────────────────────────┘
//!                                             ▼
//!                       running = true, can_execute ◄── false
//!                       status ◄── ⟨p, last?, None, true⟩
//!                                             ▼
//!                       adapter::normalize(action, p) ──► runner::drive
//!                                             │
//!             ┌───────────────────────────────┼───────────────────────────┐
//!             ▼ Ok(v)                         ▼ Err(e)                    ▼ end
//!   results ◄── v                   status ◄── ⟨p, last?, e, false⟩   running = false
//!   status  ◄── ⟨p, v, None, false⟩ failures ◄── ⟨p, e⟩             can_execute ◄── gate_open
//!   hooks.on_result                 hooks.on_exception + on_result
//! ```
//!
//! ## Gate
//! The restriction stream (constant `true` when absent) feeds `gate_open`.
//! Consecutive duplicates are ignored. On each new value `g`:
//! `can_execute = g && !running`. Error items become failures with no param.
//!
//! ## Rules
//! - `can_execute == gate_open && !running` after every transition.
//! - Overlapping `execute` calls are **dropped**, never queued.
//! - The running record of an attempt precedes all of its data/error records.
//! - `results` receives a value before the matching status record.
//! - No lock is held while subscribers or hooks run.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::CommandConfig;
use super::runner::{self, Drive, Flow};
use crate::actions::{ActionRef, adapter};
use crate::error::ActionError;
use crate::events::{Observable, Subject};
use crate::hooks::CommandHooks;
use crate::records::{CommandFailure, CommandResult};

/// Bounds shared by command parameters and results.
pub trait CommandValue: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> CommandValue for T {}

/// Handle to a command. Clones share the same engine.
pub struct Command<P, R> {
    inner: Arc<Inner<P, R>>,
}

struct State<R> {
    running: bool,
    gate_open: bool,
    locked: bool,
    last_gate: Option<bool>,
    executing: bool,
    last_result: Option<R>,
    disposed: bool,
}

pub(crate) struct Inner<P, R> {
    action: ActionRef<P, R>,
    config: CommandConfig,
    hooks: Option<Arc<dyn CommandHooks>>,
    state: Mutex<State<R>>,
    results: Subject<R>,
    status: Subject<CommandResult<P, R>>,
    executing: Subject<bool>,
    can_execute: Subject<bool>,
    failures: Subject<CommandFailure<P>>,
    token: CancellationToken,
}

impl<P: CommandValue, R: CommandValue> Inner<P, R> {
    pub(crate) fn new(
        action: ActionRef<P, R>,
        config: CommandConfig,
        hooks: Option<Arc<dyn CommandHooks>>,
        initial_last_result: Option<R>,
    ) -> Self {
        let replay = config.replays_to_new_subscriptions();
        let (results, status) = if replay {
            (Subject::replay(), Subject::replay())
        } else {
            (Subject::publish(), Subject::publish())
        };

        Self {
            action,
            config,
            hooks,
            state: Mutex::new(State {
                running: false,
                gate_open: true,
                locked: false,
                last_gate: None,
                executing: false,
                last_result: initial_last_result,
                disposed: false,
            }),
            results,
            status,
            executing: Subject::behavior(false),
            can_execute: Subject::behavior(true),
            failures: Subject::publish(),
            token: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> Option<&str> {
        self.config.debug_name.as_deref()
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("unnamed")
    }

    /// Pushes a status record and everything derived from it.
    fn push_status(&self, record: CommandResult<P, R>) {
        let flipped = {
            let mut state = self.lock();
            if state.executing != record.is_executing {
                state.executing = record.is_executing;
                true
            } else {
                false
            }
        };

        self.status.next(record.clone());
        if flipped {
            self.executing.next(record.is_executing);
        }
        if let Some(error) = &record.error {
            self.failures
                .next(CommandFailure::new(record.param.clone(), error.clone()));
        }
    }

    fn log_result(&self, record: &CommandResult<P, R>) {
        if let Some(hooks) = &self.hooks {
            hooks.on_result(self.name(), &record.as_debug());
        }
    }

    fn report_exception(&self, failure: &CommandFailure<P>) {
        if let Some(hooks) = &self.hooks {
            hooks.on_exception(self.name(), &failure.as_debug());
        }
    }

    fn baseline(&self) -> Option<R> {
        if self.config.emit_last_result {
            self.lock().last_result.clone()
        } else {
            None
        }
    }

    fn on_value(&self, param: &P, value: R) {
        self.lock().last_result = Some(value.clone());
        self.results.next(value.clone());

        let record = CommandResult::data(Some(param.clone()), value);
        self.push_status(record.clone());
        self.log_result(&record);
    }

    fn on_error(&self, param: &P, error: ActionError) {
        debug!(command = self.label(), error = %error, "attempt failed");
        let record = CommandResult::new(
            Some(param.clone()),
            self.baseline(),
            Some(error.clone()),
            false,
        );
        self.push_status(record.clone());

        self.report_exception(&CommandFailure::new(Some(param.clone()), error));
        self.log_result(&record);
    }

    /// Attempt finished: back to idle, gate decides whether we may run again.
    fn finish(&self) {
        let (can, flipped) = {
            let mut state = self.lock();
            state.running = false;
            let flipped = std::mem::replace(&mut state.executing, false);
            (!state.locked, flipped)
        };

        if flipped {
            self.executing.next(false);
        }
        self.can_execute.next(can);
    }

    fn apply_gate(&self, open: bool) {
        let can = {
            let mut state = self.lock();
            if state.disposed || state.last_gate == Some(open) {
                return;
            }
            state.last_gate = Some(open);
            state.gate_open = open;
            state.locked = !open;
            open && !state.running
        };
        debug!(command = self.label(), open, "gate changed");
        self.can_execute.next(can);
    }

    fn on_gate_error(&self, error: ActionError) {
        warn!(command = self.label(), error = %error, "restriction stream failed");
        self.failures.next(CommandFailure::new(None, error));
    }
}

/// One accepted attempt, fed by [`runner::drive`].
struct Attempt<P, R> {
    inner: Arc<Inner<P, R>>,
    param: P,
}

impl<P: CommandValue, R: CommandValue> Drive<Result<R, ActionError>> for Attempt<P, R> {
    fn on_item(&mut self, item: Result<R, ActionError>) -> Flow {
        match item {
            Ok(value) => {
                self.inner.on_value(&self.param, value);
                Flow::Continue
            }
            Err(error) => {
                self.inner.on_error(&self.param, error);
                Flow::Stop
            }
        }
    }

    fn on_complete(&mut self) {
        self.inner.finish();
    }

    fn on_no_runtime(&mut self) {
        self.inner.on_error(&self.param, ActionError::NoRuntime);
        self.inner.finish();
    }
}

/// Restriction stream subscriber.
struct Gate<P, R> {
    inner: Arc<Inner<P, R>>,
}

impl<P: CommandValue, R: CommandValue> Drive<Result<bool, ActionError>> for Gate<P, R> {
    fn on_item(&mut self, item: Result<bool, ActionError>) -> Flow {
        match item {
            Ok(open) => self.inner.apply_gate(open),
            Err(error) => self.inner.on_gate_error(error),
        }
        Flow::Continue
    }

    fn on_complete(&mut self) {
        debug!(command = self.inner.label(), "restriction stream ended");
    }

    fn on_no_runtime(&mut self) {
        warn!(
            command = self.inner.label(),
            "restriction stream is pending and no runtime is available; gate frozen"
        );
    }
}

impl<P: CommandValue, R: CommandValue> Command<P, R> {
    /// Wires the gate, pushes the optional baseline and returns the handle.
    pub(crate) fn start(
        inner: Inner<P, R>,
        restriction: Option<super::builder::Restriction>,
    ) -> Self {
        let inner = Arc::new(inner);

        match restriction {
            Some(stream) => runner::drive(
                stream,
                inner.token.clone(),
                Gate {
                    inner: Arc::clone(&inner),
                },
            ),
            None => inner.apply_gate(true),
        }

        if inner.config.emit_initial_command_result {
            let last = inner.lock().last_result.clone();
            inner.push_status(CommandResult::new(None, last, None, false));
        }

        Self { inner }
    }

    /// Attempts to start a new run with `param`.
    ///
    /// Returns immediately without any effect if the gate is closed, an attempt
    /// is already in flight, or the command was disposed.
    pub fn execute(&self, param: P) {
        let inner = &self.inner;
        {
            let mut state = inner.lock();
            if state.disposed || state.running || !state.gate_open {
                debug!(
                    command = inner.label(),
                    running = state.running,
                    gate_open = state.gate_open,
                    disposed = state.disposed,
                    "execute ignored"
                );
                return;
            }
            state.running = true;
        }

        inner.can_execute.next(false);
        inner.push_status(CommandResult::new(
            Some(param.clone()),
            inner.baseline(),
            None,
            true,
        ));

        let stream = adapter::normalize(&inner.action, param.clone(), inner.name());
        runner::drive(
            stream,
            inner.token.clone(),
            Attempt {
                inner: Arc::clone(inner),
                param,
            },
        );
    }

    /// Successfully produced values only.
    pub fn results(&self) -> Observable<R> {
        self.inner.results.observable()
    }

    /// Every status record.
    pub fn status(&self) -> Observable<CommandResult<P, R>> {
        self.inner.status.observable()
    }

    /// True while an attempt is in flight. Replays the current value.
    pub fn is_executing(&self) -> Observable<bool> {
        self.inner.executing.observable()
    }

    /// `gate_open && !running`. Replays the current value.
    pub fn can_execute(&self) -> Observable<bool> {
        self.inner.can_execute.observable()
    }

    /// Error-bearing status records and restriction failures.
    pub fn failures(&self) -> Observable<CommandFailure<P>> {
        self.inner.failures.observable()
    }

    /// Resolves with the next produced value or the next failure.
    ///
    /// Listening starts when this method is called, so it can be called before
    /// [`execute`](Self::execute) and awaited afterwards. Resolves to an
    /// [`ActionError::Disposed`] failure if the command is disposed first.
    pub fn next(&self) -> impl Future<Output = Result<R, CommandFailure<P>>> + Send + 'static {
        let mut results = self.inner.results.observable().subscribe_upcoming();
        let mut failures = self.inner.failures.observable().subscribe_upcoming();

        async move {
            tokio::select! {
                Some(value) = results.next() => Ok(value),
                Some(failure) = failures.next() => Err(failure),
                else => Err(CommandFailure::new(None, ActionError::Disposed)),
            }
        }
    }

    /// Most recent successfully produced value (or the configured seed).
    pub fn last_result(&self) -> Option<R> {
        self.inner.lock().last_result.clone()
    }

    /// True while an attempt is in flight.
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Current value of `gate_open && !running` (false once disposed).
    pub fn can_execute_now(&self) -> bool {
        let state = self.inner.lock();
        !state.disposed && state.gate_open && !state.running
    }

    /// Label configured via [`CommandConfig::debug_name`].
    pub fn debug_name(&self) -> Option<&str> {
        self.inner.name()
    }

    /// True once [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// Completes every stream and releases the gate subscription.
    ///
    /// Idempotent. Results of an attempt still in flight are not observed.
    pub fn dispose(&self) {
        let inner = &self.inner;
        {
            let mut state = inner.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }

        inner.token.cancel();
        inner.status.complete();
        inner.executing.complete();
        inner.can_execute.complete();
        inner.failures.complete();
        inner.results.complete();
        debug!(command = inner.label(), "command disposed");
    }
}

impl<P, R> Clone for Command<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> fmt::Debug for Command<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Command")
            .field("debug_name", &self.inner.config.debug_name)
            .field("running", &state.running)
            .field("gate_open", &state.gate_open)
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionOutput;
    use crate::core::CommandBuilder;
    use crate::records::{DebugFailure, DebugResult};
    use futures::{FutureExt, stream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    type Status<P, R> = CommandResult<P, R>;

    #[test]
    fn test_sync_command_publishes_result_then_status() {
        let cmd = Command::new(|param: String| format!("RESULT + {param}"));
        let mut results = cmd.results().subscribe();
        let mut status = cmd.status().subscribe();

        cmd.execute("Test".to_string());

        assert_eq!(results.drain(), vec!["RESULT + Test".to_string()]);
        assert_eq!(
            status.drain(),
            vec![
                Status::loading(Some("Test".to_string())),
                Status::data(Some("Test".to_string()), "RESULT + Test".to_string()),
            ]
        );
        assert_eq!(cmd.last_result().as_deref(), Some("RESULT + Test"));
    }

    #[test]
    fn test_stream_command_emits_every_value() {
        let cmd =
            Command::stream(|_: ()| stream::iter(vec![Ok::<_, ActionError>(1), Ok(2), Ok(3)]));
        let mut results = cmd.results().subscribe();

        cmd.execute(());

        assert_eq!(results.drain(), vec![1, 2, 3]);
        assert!(!cmd.is_running());
    }

    #[test]
    fn test_unit_action_lifecycle() {
        let cmd = Command::new(|_: ()| ());
        let mut can = cmd.can_execute().subscribe();
        let mut executing = cmd.is_executing().subscribe();
        let mut status = cmd.status().subscribe();

        assert_eq!(can.drain(), vec![true]);
        assert_eq!(executing.drain(), vec![false]);

        cmd.execute(());

        assert_eq!(
            status.drain(),
            vec![Status::loading(Some(())), Status::data(Some(()), ())]
        );
        assert_eq!(can.drain(), vec![false, true]);
        assert_eq!(executing.drain(), vec![true, false]);
    }

    #[test]
    fn test_initial_command_result_is_replayed() {
        let cmd = CommandBuilder::sync(|_: ()| ())
            .with_initial_command_result(true)
            .build();
        let mut status = cmd.status().subscribe();
        assert_eq!(status.drain(), vec![Status::blank()]);

        cmd.execute(());
        assert_eq!(
            status.drain(),
            vec![Status::loading(Some(())), Status::data(Some(()), ())]
        );
    }

    #[test]
    fn test_initial_command_result_carries_seed() {
        let cmd = CommandBuilder::sync(|n: u32| n)
            .with_initial_command_result(true)
            .with_initial_result(7)
            .build();
        let mut status = cmd.status().subscribe();
        assert_eq!(status.drain(), vec![Status::new(None, Some(7), None, false)]);
        assert_eq!(cmd.last_result(), Some(7));
    }

    #[test]
    fn test_parameter_is_passed_through() {
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let cmd = Command::new(move |x: String| {
            *sink.lock().unwrap() = x;
        });
        let mut status = cmd.status().subscribe();

        cmd.execute("PARAM".to_string());

        assert_eq!(*seen.lock().unwrap(), "PARAM");
        assert_eq!(
            status.drain(),
            vec![
                Status::loading(Some("PARAM".to_string())),
                Status::data(Some("PARAM".to_string()), ()),
            ]
        );
    }

    #[test]
    fn test_action_error_becomes_status_and_failure() {
        let cmd = Command::fallible(|n: u32| if n > 1 { Err("too big") } else { Ok(n) });
        let mut results = cmd.results().subscribe();
        let mut status = cmd.status().subscribe();
        let mut failures = cmd.failures().subscribe();

        cmd.execute(5);

        assert!(results.drain().is_empty());
        assert_eq!(
            status.drain(),
            vec![
                Status::loading(Some(5)),
                Status::error(Some(5), ActionError::fail("too big")),
            ]
        );
        assert_eq!(
            failures.drain(),
            vec![CommandFailure::new(Some(5), ActionError::fail("too big"))]
        );
        assert!(cmd.can_execute_now());

        cmd.execute(1);
        assert_eq!(results.drain(), vec![1]);
    }

    #[test]
    fn test_emit_last_result_carries_baseline() {
        let cmd = CommandBuilder::fallible(|n: u32| if n == 0 { Err("zero") } else { Ok(n) })
            .with_last_result(true)
            .build();
        let mut status = cmd.status().subscribe();

        cmd.execute(3);
        cmd.execute(0);

        assert_eq!(
            status.drain(),
            vec![
                Status::new(Some(3), None, None, true),
                Status::data(Some(3), 3),
                Status::new(Some(0), Some(3), None, true),
                Status::new(Some(0), Some(3), Some(ActionError::fail("zero")), false),
            ]
        );
    }

    #[test]
    fn test_replay_to_late_subscribers() {
        let cmd = CommandBuilder::sync(|n: u32| n * 10).with_replay(true).build();
        cmd.execute(1);

        let mut late_results = cmd.results().subscribe();
        let mut late_status = cmd.status().subscribe();
        assert_eq!(late_results.drain(), vec![10]);
        assert_eq!(late_status.drain(), vec![Status::data(Some(1), 10)]);

        let plain = Command::new(|n: u32| n);
        plain.execute(1);
        assert!(plain.results().subscribe().drain().is_empty());
    }

    #[test]
    fn test_dispose_is_idempotent_and_disables_execute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cmd = Command::new(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut status = cmd.status().subscribe();

        cmd.dispose();
        cmd.dispose();
        cmd.execute(());

        assert!(cmd.is_disposed());
        assert!(!cmd.can_execute_now());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(status.next().now_or_never(), Some(None));
    }

    #[test]
    fn test_panicking_action_returns_to_idle() {
        let cmd = CommandBuilder::new(|_: ()| -> ActionOutput<u8> { panic!("handler exploded") })
            .with_debug_name("panicky")
            .build();
        let mut status = cmd.status().subscribe();
        let mut failures = cmd.failures().subscribe();
        let mut executing = cmd.is_executing().subscribe();

        cmd.execute(());

        assert_eq!(status.drain(), vec![Status::loading(Some(()))]);
        assert!(failures.drain().is_empty());
        assert_eq!(executing.drain(), vec![false, true, false]);
        assert!(cmd.can_execute_now());
    }

    #[test]
    fn test_pending_action_without_runtime_fails() {
        let cmd = Command::future(|_: ()| futures::future::pending::<Result<u8, ActionError>>());
        let mut failures = cmd.failures().subscribe();

        cmd.execute(());

        assert_eq!(
            failures.drain(),
            vec![CommandFailure::new(Some(()), ActionError::NoRuntime)]
        );
        assert!(!cmd.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_command_called_twice_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cmd = Command::future(move |s: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                sleep(Duration::from_millis(100)).await;
                Ok::<_, ActionError>(s)
            }
        });

        let mut can = cmd.can_execute().subscribe();
        let mut executing = cmd.is_executing().subscribe();
        let mut status = cmd.status().subscribe();

        cmd.execute("Done".to_string());
        sleep(Duration::from_millis(50)).await;
        cmd.execute("Done".to_string());
        sleep(Duration::from_millis(60)).await;

        assert_eq!(
            status.drain(),
            vec![
                Status::loading(Some("Done".to_string())),
                Status::data(Some("Done".to_string()), "Done".to_string()),
            ]
        );
        assert_eq!(can.drain(), vec![true, false, true]);
        assert_eq!(executing.drain(), vec![false, true, false]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_stream_values_arrive_in_order() {
        let cmd = Command::stream(|n: u64| {
            stream::iter(1..=n).then(|i| async move {
                sleep(Duration::from_millis(10)).await;
                Ok::<_, ActionError>(i)
            })
        });
        let mut results = cmd.results().subscribe();

        cmd.execute(3);
        assert!(cmd.is_running());
        sleep(Duration::from_millis(50)).await;

        assert_eq!(results.drain(), vec![1, 2, 3]);
        assert!(!cmd.is_running());
        assert!(cmd.can_execute_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restriction_closes_gate() {
        let gate = crate::events::Subject::behavior(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cmd = CommandBuilder::sync(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_restriction(gate.observable().subscribe())
        .build();

        let mut can = cmd.can_execute().subscribe();
        let mut executing = cmd.is_executing().subscribe();
        assert_eq!(can.drain(), vec![true]);

        cmd.execute(());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(can.drain(), vec![false, true]);

        gate.next(false);
        sleep(Duration::from_millis(1)).await;

        assert_eq!(can.drain(), vec![false]);
        assert_eq!(executing.drain(), vec![false, true, false]);

        cmd.execute(());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.next(true);
        sleep(Duration::from_millis(1)).await;
        cmd.execute(());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_reopening_while_running_waits_for_completion() {
        let gate = crate::events::Subject::behavior(true);
        let cmd = CommandBuilder::future(|_: ()| async {
            sleep(Duration::from_millis(100)).await;
            Ok::<_, ActionError>(())
        })
        .with_restriction(gate.observable().subscribe())
        .build();
        let mut can = cmd.can_execute().subscribe();

        cmd.execute(());
        gate.next(false);
        sleep(Duration::from_millis(10)).await;
        gate.next(true);
        sleep(Duration::from_millis(10)).await;

        assert!(!cmd.can_execute_now());
        assert_eq!(can.drain(), vec![true, false, false, false]);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(can.drain(), vec![true]);
        assert!(cmd.can_execute_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_closed_when_attempt_ends_keeps_command_locked() {
        let gate = crate::events::Subject::behavior(true);
        let cmd = CommandBuilder::future(|_: ()| async {
            sleep(Duration::from_millis(20)).await;
            Ok::<_, ActionError>(())
        })
        .with_restriction(gate.observable().subscribe())
        .build();
        let mut can = cmd.can_execute().subscribe();

        cmd.execute(());
        gate.next(false);
        sleep(Duration::from_millis(50)).await;

        assert_eq!(can.drain(), vec![true, false, false, false]);
        assert!(!cmd.can_execute_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_gate_values_are_ignored() {
        let gate = crate::events::Subject::behavior(true);
        let cmd = CommandBuilder::sync(|_: ()| ())
            .with_restriction(gate.observable().subscribe())
            .build();
        let mut can = cmd.can_execute().subscribe();

        gate.next(true);
        gate.next(false);
        gate.next(false);
        gate.next(true);
        sleep(Duration::from_millis(1)).await;

        assert_eq!(can.drain(), vec![true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restriction_error_becomes_failure_without_param() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<bool, ActionError>>();
        let cmd = CommandBuilder::sync(|n: u8| n)
            .with_fallible_restriction(rx)
            .build();
        let mut failures = cmd.failures().subscribe();

        tx.unbounded_send(Ok(false)).unwrap();
        tx.unbounded_send(Err(ActionError::fail("gate down"))).unwrap();
        sleep(Duration::from_millis(1)).await;

        assert_eq!(
            failures.drain(),
            vec![CommandFailure::new(None, ActionError::restriction("gate down"))]
        );
        assert!(!cmd.can_execute_now());

        tx.unbounded_send(Ok(true)).unwrap();
        sleep(Duration::from_millis(1)).await;
        assert!(cmd.can_execute_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_drops_in_flight_results() {
        let cmd = Command::future(|n: u32| async move {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, ActionError>(n)
        });
        let mut results = cmd.results().subscribe();

        cmd.execute(1);
        cmd.dispose();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(results.next().await, None);
        assert_eq!(cmd.last_result(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_resolves_with_value_or_failure() {
        let cmd = Command::future(|n: u32| async move {
            sleep(Duration::from_millis(5)).await;
            if n == 0 {
                Err(ActionError::fail("zero"))
            } else {
                Ok(n)
            }
        });

        let next = cmd.next();
        cmd.execute(4);
        assert_eq!(next.await, Ok(4));

        let next = cmd.next();
        cmd.execute(0);
        assert_eq!(
            next.await,
            Err(CommandFailure::new(Some(0), ActionError::fail("zero")))
        );

        let next = cmd.next();
        cmd.dispose();
        assert_eq!(
            next.await,
            Err(CommandFailure::new(None, ActionError::Disposed))
        );
    }

    #[test]
    fn test_stream_error_ends_attempt() {
        let cmd = Command::stream(|_: ()| {
            stream::iter(vec![Ok(1), Err(ActionError::fail("mid-stream")), Ok(3)])
        });
        let mut results = cmd.results().subscribe();
        let mut failures = cmd.failures().subscribe();

        cmd.execute(());

        assert_eq!(results.drain(), vec![1]);
        assert_eq!(
            failures.drain(),
            vec![CommandFailure::new(Some(()), ActionError::fail("mid-stream"))]
        );
        assert_eq!(cmd.last_result(), Some(1));
        assert!(!cmd.is_running());
        assert!(cmd.can_execute_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_error_types_convert() {
        let read = Command::future(|path: String| async move {
            sleep(Duration::from_millis(1)).await;
            Err::<u64, _>(std::io::Error::other(format!("{path}: missing")))
        });
        let lines = Command::stream(|n: u32| stream::iter((0..n).map(Ok::<_, String>)));

        let next = read.next();
        read.execute("a.txt".to_string());
        assert_eq!(
            next.await,
            Err(CommandFailure::new(
                Some("a.txt".to_string()),
                ActionError::fail("a.txt: missing")
            ))
        );

        let mut values = lines.results().subscribe();
        lines.execute(2);
        assert_eq!(values.drain(), vec![0, 1]);
    }

    #[derive(Default)]
    struct Counting {
        results: AtomicUsize,
        exceptions: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    impl CommandHooks for Counting {
        fn on_exception(&self, debug_name: Option<&str>, failure: &DebugFailure<'_>) {
            self.exceptions.fetch_add(1, Ordering::SeqCst);
            self.names
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", debug_name.unwrap_or("-"), failure.param));
        }

        fn on_result(&self, _debug_name: Option<&str>, _result: &DebugResult<'_>) {
            self.results.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_injected_hooks_see_results_and_exceptions() {
        let hooks = Arc::new(Counting::default());
        let cmd = CommandBuilder::fallible(|n: u32| if n == 0 { Err("zero") } else { Ok(n) })
            .with_debug_name("divide")
            .with_hooks(hooks.clone())
            .build();

        cmd.execute(1);
        cmd.execute(0);

        assert_eq!(hooks.results.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.exceptions.load(Ordering::SeqCst), 1);
        assert_eq!(*hooks.names.lock().unwrap(), vec!["divide:Some(0)".to_string()]);
    }

    #[test]
    fn test_global_hooks_are_captured_at_build() {
        struct Named(Arc<AtomicUsize>);

        impl CommandHooks for Named {
            fn on_result(&self, debug_name: Option<&str>, _result: &DebugResult<'_>) {
                if debug_name == Some("global-hooks-probe") {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let hits = Arc::new(AtomicUsize::new(0));
        crate::hooks::set_global_hooks(Arc::new(Named(Arc::clone(&hits))));
        let cmd = CommandBuilder::sync(|n: u8| n)
            .with_debug_name("global-hooks-probe")
            .build();
        crate::hooks::clear_global_hooks();

        cmd.execute(1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
