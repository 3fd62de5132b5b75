//! # Example: gated_command
//!
//! A command that may only run while an external condition holds.
//!
//! Demonstrates how to:
//! - Feed a restriction stream from a [`Subject`].
//! - Observe `can_execute` change with the gate and with running attempts.
//! - See that calls made while the gate is closed are dropped.
//!
//! ## Flow
//! ```text
//! online: true  ──► can_execute: true
//! execute(1)    ──► can_execute: false ──► (50ms) ──► true
//! online: false ──► can_execute: false
//! execute(2)    ──► dropped
//! online: true  ──► can_execute: true
//! execute(3)    ──► runs
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example gated_command
//! ```

use std::time::Duration;

use futures::StreamExt;
use rxcommand::{ActionError, CommandBuilder, Subject};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. The gate
    let online = Subject::behavior(true);

    // 2. The command
    let sync = CommandBuilder::future(|batch: u32| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, ActionError>(batch * 100)
    })
    .with_debug_name("sync")
    .with_restriction(online.observable().subscribe())
    .build();

    // 3. Print gate changes from a background task
    let mut can = sync.can_execute().subscribe();
    let printer = tokio::spawn(async move {
        while let Some(value) = can.next().await {
            println!("[can_execute] {value}");
        }
    });
    let _results = sync
        .results()
        .observe(|synced| println!("[results] synced {synced} records"));

    // 4. Run, close the gate, try again, reopen
    sync.execute(1);
    tokio::time::sleep(Duration::from_millis(100)).await;

    online.next(false);
    tokio::time::sleep(Duration::from_millis(10)).await;
    sync.execute(2);
    println!("[main] running after gated call: {}", sync.is_running());

    online.next(true);
    tokio::time::sleep(Duration::from_millis(10)).await;
    sync.execute(3);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 5. Dispose ends every stream, so the printer task finishes
    sync.dispose();
    printer.await?;
    Ok(())
}
