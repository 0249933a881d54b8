//! Shared helpers for session integration tests.
//!
//! Provides a callback recorder, send metrics and setup shortcuts over the
//! in-memory transport.

#![allow(dead_code)]

mod metrics;
mod recorder;

pub use metrics::Metrics;
pub use recorder::Recorder;

use rsws_session::transport::memory::MemoryBehavior;
use rsws_session::{Client, InlineExecutor, MemoryConnection, MemoryTransport, Session};

/// Install a `tracing` subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Behavior that holds every write until the test completes it.
pub fn manual_writes() -> MemoryBehavior {
    MemoryBehavior {
        manual_writes: true,
        ..MemoryBehavior::default()
    }
}

/// Inline client over a fresh memory transport with `behavior`.
pub fn inline_client(behavior: MemoryBehavior) -> (Client, MemoryTransport) {
    init_tracing();
    let transport = MemoryTransport::with_behavior(behavior);
    let client = Client::new(transport.clone(), InlineExecutor);
    (client, transport)
}

/// Create a session on `client` and connect it, asserting success.
pub fn connect(client: &Client, transport: &MemoryTransport) -> (Session, MemoryConnection) {
    let session = client.create_session();
    let result = session
        .connect("ws://test.local/socket", "")
        .expect("connect accepted")
        .wait_blocking()
        .expect("result available");
    assert!(result.is_ok(), "connect failed: {result:?}");
    drop(result);
    let conn = transport.last_connection().expect("connection opened");
    (session, conn)
}
