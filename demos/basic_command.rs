//! # Example: basic_command
//!
//! One async command observed through hooks, streams and a collector.
//!
//! Demonstrates how to:
//! - Build a [`Command`] around an async handler.
//! - Log every result and exception with [`LogWriter`].
//! - Watch `status` with a callback and await [`Command::next`].
//! - Hand everything to a [`Collector`] for teardown.
//!
//! ## Flow
//! ```text
//! execute("bob") ──► status: running ──► (20ms) ──► results: "welcome bob"
//!                                                   status: data
//! execute("eve") ──► status: running ──► (20ms) ──► status: error
//!                                                   failures ──► Collector sink
//! Collector::dispose() ──► every stream completes
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic_command --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use rxcommand::{ActionError, Collector, CommandBuilder, LogWriter, Reference};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Structured logs (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Define the command
    let login = CommandBuilder::future(|user: String| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if user == "eve" {
            Err(ActionError::fail("access denied"))
        } else {
            Ok(format!("welcome {user}"))
        }
    })
    .with_debug_name("login")
    .with_last_result(true)
    .with_hooks(Arc::new(LogWriter::new()))
    .build();

    // 3. Watch the status stream
    let collector = Collector::new();
    let watcher = login.status().observe(|record| println!("[status] {record}"));
    collector.add([Reference::from(watcher), Reference::from(&login)]);

    // 4. A successful attempt
    let next = login.next();
    login.execute("bob".into());
    login.execute("ignored while running".into());
    println!("[main] got: {:?}", next.await);

    // 5. A failing attempt
    let next = login.next();
    login.execute("eve".into());
    match next.await {
        Ok(value) => println!("[main] unexpected: {value}"),
        Err(failure) => println!("[main] failed: {failure}"),
    }

    // 6. Tear down
    collector.dispose();
    println!("[main] disposed: {}", login.is_disposed());
    Ok(())
}
