//! Records every callback a client delivers.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rsws_session::{Client, CloseStatus};
use tokio::sync::Notify;

/// Message and close callbacks captured in arrival order.
#[derive(Default)]
pub struct Recorder {
    messages: Mutex<Vec<(u64, String)>>,
    closes: Mutex<Vec<(u64, CloseStatus)>>,
    changed: Notify,
}

impl Recorder {
    /// Register a new recorder as `client`'s callback pair.
    pub fn install(client: &Client) -> Arc<Self> {
        let recorder = Arc::new(Self::default());

        let sink = recorder.clone();
        client.set_message_function(move |session, text| {
            sink.messages.lock().push((session.id(), text.to_string()));
            sink.changed.notify_waiters();
        });
        let sink = recorder.clone();
        client.set_close_function(move |session, status| {
            sink.closes.lock().push((session.id(), status));
            sink.changed.notify_waiters();
        });

        recorder
    }

    pub fn messages(&self) -> Vec<(u64, String)> {
        self.messages.lock().clone()
    }

    /// Message texts only.
    pub fn texts(&self) -> Vec<String> {
        self.messages.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn closes(&self) -> Vec<(u64, CloseStatus)> {
        self.closes.lock().clone()
    }

    /// Wait until at least `count` messages arrived, or panic after five
    /// seconds.
    pub async fn wait_for_messages(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.changed.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.messages.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for messages");
    }
}
