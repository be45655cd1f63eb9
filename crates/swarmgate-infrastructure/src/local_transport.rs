//! In-process transport pair.
//!
//! Two connected endpoints implementing the [`Transport`] trait. `send` from
//! one side dispatches to the handler registered on the other side on a
//! spawned task; `invoke` awaits the peer handler's reply. This is the
//! stand-in for the host application's IPC layer in tests and single-process
//! embedders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;

use swarmgate_core::transport::{MessageHandler, Transport};
use swarmgate_core::{Result, SwarmError};

/// One endpoint of an in-process transport pair.
pub struct LocalTransport {
    handlers: Mutex<HashMap<String, MessageHandler>>,
    peer: Mutex<Weak<LocalTransport>>,
}

impl LocalTransport {
    /// Creates two connected endpoints.
    ///
    /// Each endpoint holds only a weak reference to its peer; dropping one
    /// side makes the other report transport errors instead of leaking the
    /// pair.
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let a = Arc::new(Self::disconnected());
        let b = Arc::new(Self::disconnected());
        *a.peer.lock().unwrap() = Arc::downgrade(&b);
        *b.peer.lock().unwrap() = Arc::downgrade(&a);
        (a, b)
    }

    fn disconnected() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            peer: Mutex::new(Weak::new()),
        }
    }

    fn peer(&self) -> Result<Arc<Self>> {
        self.peer
            .lock()
            .unwrap()
            .upgrade()
            .ok_or_else(|| SwarmError::transport("peer endpoint is gone"))
    }

    fn handler_for(&self, channel: &str) -> Option<MessageHandler> {
        self.handlers.lock().unwrap().get(channel).cloned()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        let peer = self.peer()?;
        let Some(handler) = peer.handler_for(channel) else {
            // Fire-and-forget: nobody listening is not a delivery failure.
            tracing::debug!(channel, "no handler for notification");
            return Ok(());
        };

        let channel = channel.to_string();
        tokio::spawn(async move {
            if let Err(e) = handler(payload).await {
                tracing::warn!(channel, error = %e, "notification handler failed");
            }
        });
        Ok(())
    }

    async fn invoke(&self, channel: &str, payload: serde_json::Value) -> Result<serde_json::Value> {
        let peer = self.peer()?;
        let handler = peer
            .handler_for(channel)
            .ok_or_else(|| SwarmError::transport(format!("no handler for channel '{}'", channel)))?;
        handler(payload).await
    }

    fn on(&self, channel: &str, handler: MessageHandler) {
        self.handlers
            .lock()
            .unwrap()
            .insert(channel.to_string(), handler);
    }
}
