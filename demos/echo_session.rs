//! Echo session walkthrough.
//!
//! Connects a session to an in-memory echo transport, sends a few
//! messages, prints what comes back and closes the session.
//!
//! Run with: `RUST_LOG=rsws_session=debug cargo run --example echo_session`

use rsws_session::{Client, CloseStatus, Config, MemoryTransport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> rsws_session::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::new().with_user_agent("rsws-session-demo/0.1");
    let client = Client::tokio(config, MemoryTransport::echo())?;

    client.set_message_function(|session, text| {
        println!("[session {}] received: {}", session.id(), text);
    });
    client.set_close_function(|session, status| {
        println!("[session {}] closed: {:?} ({})", session.id(), status, status.as_u16());
    });

    let session = client.create_session();
    session.set_header("X-Demo", "echo")?;

    let connected = session.connect("ws://echo.local/socket", "chat, json")?.wait().await?;
    println!(
        "connect finished: {:?} (code {})",
        connected.status, connected.platform_error_code
    );

    let mut pending = Vec::new();
    for text in ["hello", "from", "rsws-session"] {
        pending.push(session.send_message(text)?);
    }
    for op in pending {
        let result = op.wait().await?;
        println!("send finished: {:?}", result.status);
    }

    session.disconnect(CloseStatus::Normal)?;
    println!("final state: {}", session.state());
    Ok(())
}
