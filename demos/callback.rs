//! Two services on fixed ports: `clock` hands `alarm` a reference to its own
//! `ring` function, and `alarm` calls it back.
//!
//! Run with `RUST_LOG=debug cargo run --example callback` to see the dispatch
//! logs.

use rpcref::{CallStub, RemoteFunctionRef, Service, ServiceEntry, WaitPolicy};
use std::time::Duration;
use tokio::{task, time};
use tracing_subscriber::EnvFilter;

const CLOCK: ServiceEntry = ServiceEntry::new("clock", 8870);
const ALARM: ServiceEntry = ServiceEntry::new("alarm", 8871);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut clock = Service::new(CLOCK);
    clock.register("ring", |label: String| async move {
        println!("ring! ({label})");
        true
    })?;
    let ring = clock.reference("ring").ok_or("`ring` is registered above")?;
    task::spawn(clock.serve());

    let mut alarm = Service::new(ALARM);
    alarm.register(
        "set",
        |callback: RemoteFunctionRef, after_ms: u64, label: String| async move {
            time::sleep(Duration::from_millis(after_ms)).await;
            callback
                .invoke::<_, _, bool>(&CallStub::new(), (label,))
                .await
                .map_err(|e| e.to_string())
        },
    )?;
    task::spawn(alarm.serve());

    let stub = CallStub::new();
    for entry in [&CLOCK, &ALARM] {
        if !entry.wait_startup(&stub, WaitPolicy::default()).await {
            return Err(format!("{} did not start", entry.name).into());
        }
    }

    let rang: bool = stub
        .call(ALARM.addr(), "set", (ring, 100u64, "tea is ready"))
        .await?;
    println!("alarm reported: {rang}");
    Ok(())
}
