//! Transport handler registration for the `interaction.*` channels.
//!
//! These handlers are the privileged side's inbound surface: decisions,
//! pending-list queries, and clear requests arrive here from the approval
//! surface. Malformed payloads never fail the transport call; they are
//! logged and answered with a failure ack.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use swarmgate_core::transport::{
    ClearAck, ClearRequest, ListPendingQuery, ResponseAck, ResponseEnvelope, Transport, channels,
};

use crate::manager::InteractionManager;

/// Answers whether a thread's owning task has finished.
///
/// After a decision resumes an interaction, the resumed graph may run to
/// completion before the ack goes back; the probe lets the ack carry that
/// outcome so the surface can close out the task in one round trip.
#[async_trait]
pub trait CompletionProbe: Send + Sync {
    /// Returns the completion summary for `thread_id`, or `None` when the
    /// task is still running.
    async fn task_completion(&self, thread_id: &str) -> Option<String>;
}

/// Registers the inbound `interaction.*` handlers on `transport`.
///
/// Call once at startup, after constructing the manager. The optional
/// `probe` enriches response acks with task-completion state.
pub fn register_interaction_handlers(
    transport: &dyn Transport,
    manager: Arc<InteractionManager>,
    probe: Option<Arc<dyn CompletionProbe>>,
) {
    {
        let manager = manager.clone();
        transport.on(
            channels::INTERACTION_RESPONSE,
            Arc::new(move |payload| {
                let manager = manager.clone();
                let probe = probe.clone();
                async move { handle_response(&manager, probe.as_deref(), payload).await }.boxed()
            }),
        );
    }

    {
        let manager = manager.clone();
        transport.on(
            channels::INTERACTION_LIST_PENDING,
            Arc::new(move |payload| {
                let manager = manager.clone();
                async move { handle_list_pending(&manager, payload).await }.boxed()
            }),
        );
    }

    transport.on(
        channels::INTERACTION_CLEAR,
        Arc::new(move |payload| {
            let manager = manager.clone();
            async move { handle_clear(&manager, payload).await }.boxed()
        }),
    );
}

async fn handle_response(
    manager: &InteractionManager,
    probe: Option<&dyn CompletionProbe>,
    payload: serde_json::Value,
) -> swarmgate_core::Result<serde_json::Value> {
    let envelope: ResponseEnvelope = match serde_json::from_value(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "malformed interaction response");
            return ack(ResponseAck {
                success: false,
                task_complete: false,
                summary: None,
            });
        }
    };

    let resolved = manager
        .resolve(&envelope.interaction_id, envelope.response)
        .await;

    let (task_complete, summary) = match (&resolved, probe) {
        (Some(request), Some(probe)) => match probe.task_completion(&request.thread_id).await {
            Some(summary) => (true, Some(summary)),
            None => (false, None),
        },
        _ => (false, None),
    };

    ack(ResponseAck {
        success: resolved.is_some(),
        task_complete,
        summary,
    })
}

async fn handle_list_pending(
    manager: &InteractionManager,
    payload: serde_json::Value,
) -> swarmgate_core::Result<serde_json::Value> {
    // A malformed query degrades to "list everything".
    let query: ListPendingQuery = serde_json::from_value(payload).unwrap_or_default();
    let pending = manager.pending_interactions(query.thread_id.as_deref()).await;
    Ok(serde_json::to_value(pending)?)
}

async fn handle_clear(
    manager: &InteractionManager,
    payload: serde_json::Value,
) -> swarmgate_core::Result<serde_json::Value> {
    let request: ClearRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "malformed clear request");
            return ack(ClearAck {
                success: false,
                removed: 0,
            });
        }
    };

    let removed = manager.clear_thread(&request.thread_id).await;
    ack(ClearAck {
        success: true,
        removed,
    })
}

fn ack<T: serde::Serialize>(value: T) -> swarmgate_core::Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
