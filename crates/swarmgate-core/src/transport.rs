//! Transport abstraction for cross-process messaging.
//!
//! The coordinator and the approval surface live on opposite sides of a
//! process boundary (the host application's IPC layer). The core logic is
//! transport-agnostic: everything goes through this trait, so both sides
//! can be tested in one process with the in-process transport from the
//! infrastructure crate.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interaction::{InteractionRequest, InteractionResponse};

/// Well-known channel names used by the interaction protocol.
pub mod channels {
    /// Privileged → UI: a new interaction request (fire-and-forget).
    pub const INTERACTION_REQUEST: &str = "interaction.request";
    /// UI → privileged: a decision for a pending interaction (request/reply).
    pub const INTERACTION_RESPONSE: &str = "interaction.response";
    /// UI → privileged: enumerate pending interactions (request/reply).
    pub const INTERACTION_LIST_PENDING: &str = "interaction.listPending";
    /// UI → privileged: clear all interactions for a thread (request/reply).
    pub const INTERACTION_CLEAR: &str = "interaction.clear";
    /// Privileged → UI: an interaction finished processing (fire-and-forget).
    pub const INTERACTION_RESOLVED: &str = "interaction.resolved";
}

/// Async message handler registered for one channel.
pub type MessageHandler =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value>> + Send + Sync>;

/// A typed message bus connecting the two sides of the process boundary.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a fire-and-forget notification to the peer.
    async fn send(&self, channel: &str, payload: serde_json::Value) -> Result<()>;

    /// Sends a request to the peer and awaits its reply.
    async fn invoke(&self, channel: &str, payload: serde_json::Value) -> Result<serde_json::Value>;

    /// Registers the handler invoked for messages arriving on `channel`.
    fn on(&self, channel: &str, handler: MessageHandler);
}

// ============================================================================
// Channel payload envelopes
// ============================================================================

/// Payload of `interaction.request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub interaction_id: String,
    pub request: InteractionRequest,
}

/// Payload of `interaction.response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub interaction_id: String,
    pub response: InteractionResponse,
}

/// Reply to `interaction.response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAck {
    /// Whether the decision resumed a pending interaction.
    pub success: bool,
    /// Whether the owning task is now complete.
    #[serde(default)]
    pub task_complete: bool,
    /// Optional human-readable outcome summary when the task completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Payload of `interaction.listPending`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Payload of `interaction.clear`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    pub thread_id: String,
}

/// Reply to `interaction.clear`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearAck {
    pub success: bool,
    /// Number of pending entries removed.
    pub removed: usize,
}

/// Payload of `interaction.resolved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEnvelope {
    pub interaction_id: String,
    pub response: InteractionResponse,
}
