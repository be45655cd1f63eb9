//! The pending-interaction registry and resume trigger.
//!
//! `InteractionManager` is the single authoritative registry of pending
//! human-interaction requests for one process. The four `request_*` methods
//! create a request, register a suspension point on the interrupt gate,
//! notify the approval surface over the transport, and then await the
//! injected decision. `handle_response` is the resume trigger.
//!
//! Failure semantics: no `request_*` call ever fails outright. When a
//! suspension is dropped without a response (thread cleared, surface gone)
//! or the response carries no usable payload, the call resolves to a
//! conservative default: `false`, the empty string, or the unchanged input
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use swarmgate_core::interaction::{InteractionRequest, InteractionResponse, RiskLevel};
use swarmgate_core::transport::{RequestEnvelope, ResolvedEnvelope, Transport, channels};

use crate::interrupt::InterruptGate;
use crate::policy::ApprovalPolicy;

/// Single authoritative registry of pending human interactions.
///
/// Construct one per process at startup and inject it into the graph engine
/// integration point and the transport handler registration; there is no
/// hidden global instance.
pub struct InteractionManager {
    /// Pending requests keyed by interaction id. Mutated only by this
    /// manager, atomically within one lock acquisition.
    pending: Mutex<HashMap<String, InteractionRequest>>,
    /// Suspension primitive holding the resume slots.
    gate: InterruptGate,
    /// Per-thread cancellation tokens handed to the graph engine.
    threads: Mutex<HashMap<String, CancellationToken>>,
    /// Push channel to the approval surface.
    transport: Arc<dyn Transport>,
    /// Optional programmatic approval policy.
    policy: Option<Arc<dyn ApprovalPolicy>>,
}

impl InteractionManager {
    /// Creates a manager pushing notifications over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            gate: InterruptGate::new(),
            threads: Mutex::new(HashMap::new()),
            transport,
            policy: None,
        }
    }

    /// Installs a programmatic approval policy.
    pub fn with_policy(mut self, policy: Arc<dyn ApprovalPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    // ============================================================================
    // Request API (called from graph nodes)
    // ============================================================================

    /// Gates execution of a named external tool behind a human decision.
    ///
    /// Suspends until a response arrives; resolves to the decision, or
    /// `false` when the suspension is dropped without one.
    pub async fn request_tool_approval(
        &self,
        tool_name: &str,
        tool_arguments: serde_json::Value,
        description: &str,
        risk_level: RiskLevel,
        thread_id: &str,
    ) -> bool {
        let request = InteractionRequest::tool_approval(
            tool_name,
            tool_arguments,
            description,
            risk_level,
            thread_id,
        );
        self.await_decision(request)
            .await
            .map(|response| response.approved)
            .unwrap_or(false)
    }

    /// Lets a human edit a state snapshot before execution continues.
    ///
    /// Resolves to the edited state when the response carries one, otherwise
    /// to `current_state` unchanged. Absence of edits is a valid default,
    /// never a failure.
    pub async fn request_state_edit(
        &self,
        current_state: serde_json::Value,
        editable_field_names: Vec<String>,
        instructions: &str,
        thread_id: &str,
    ) -> serde_json::Value {
        let request = InteractionRequest::state_edit(
            current_state.clone(),
            editable_field_names,
            instructions,
            thread_id,
        );
        self.await_decision(request)
            .await
            .and_then(|response| response.edited_data)
            .unwrap_or(current_state)
    }

    /// Asks a human for free-text input.
    ///
    /// Resolves to the answer, or the empty string when none was provided.
    pub async fn request_human_input(
        &self,
        prompt: &str,
        context: serde_json::Value,
        thread_id: &str,
    ) -> String {
        let request = InteractionRequest::human_input(prompt, context, thread_id);
        self.await_decision(request)
            .await
            .and_then(|response| response.user_input)
            .unwrap_or_default()
    }

    /// Requests a generic approval of an arbitrary context object.
    ///
    /// Resolves to the decision, defaulting to `false`.
    pub async fn request_approval(
        &self,
        title: &str,
        description: &str,
        data: serde_json::Value,
        thread_id: &str,
    ) -> bool {
        let request = InteractionRequest::approval(title, description, data, thread_id);
        self.await_decision(request)
            .await
            .map(|response| response.approved)
            .unwrap_or(false)
    }

    // ============================================================================
    // Resume API (called from transport handlers)
    // ============================================================================

    /// Handles a decision arriving from the approval surface.
    ///
    /// Unknown or already-resolved ids are harmless: they are logged and
    /// ignored. Returns true when a pending interaction was resumed.
    pub async fn handle_response(
        &self,
        interaction_id: &str,
        response: InteractionResponse,
    ) -> bool {
        self.resolve(interaction_id, response).await.is_some()
    }

    /// Resolves a pending interaction, returning the request it answered.
    ///
    /// The entry is removed before the waiter is resumed, so a second
    /// response for the same id finds nothing and resumes nothing.
    pub(crate) async fn resolve(
        &self,
        interaction_id: &str,
        response: InteractionResponse,
    ) -> Option<InteractionRequest> {
        let removed = { self.pending.lock().await.remove(interaction_id) };
        let Some(request) = removed else {
            tracing::info!(
                interaction_id,
                "response for unknown interaction ignored (late or duplicate)"
            );
            return None;
        };

        if !self.gate.resume(interaction_id, response.clone()).await {
            tracing::warn!(interaction_id, "no live waiter for resumed interaction");
        }
        self.notify_resolved(interaction_id, &response).await;
        Some(request)
    }

    // ============================================================================
    // Read API
    // ============================================================================

    /// Returns all pending interactions, optionally filtered by thread,
    /// oldest first. Read-only.
    pub async fn pending_interactions(&self, thread_id: Option<&str>) -> Vec<InteractionRequest> {
        let pending = self.pending.lock().await;
        let mut requests: Vec<InteractionRequest> = pending
            .values()
            .filter(|request| thread_id.is_none_or(|id| request.thread_id == id))
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        requests
    }

    // ============================================================================
    // Lifecycle API
    // ============================================================================

    /// Removes all pending entries for a thread without resuming them.
    ///
    /// Dropped waiters resolve to their conservative defaults. The thread's
    /// cancellation token is cancelled so the graph engine can abort the
    /// underlying execution; the manager itself only drops bookkeeping.
    /// Returns the number of entries removed.
    pub async fn clear_thread(&self, thread_id: &str) -> usize {
        let removed_ids: Vec<String> = {
            let mut pending = self.pending.lock().await;
            let ids: Vec<String> = pending
                .values()
                .filter(|request| request.thread_id == thread_id)
                .map(|request| request.id.clone())
                .collect();
            for id in &ids {
                pending.remove(id);
            }
            ids
        };

        for id in &removed_ids {
            self.gate.drop_waiter(id).await;
        }

        if let Some(token) = self.threads.lock().await.remove(thread_id) {
            token.cancel();
        }

        if !removed_ids.is_empty() {
            tracing::info!(
                thread_id,
                removed = removed_ids.len(),
                "cleared pending interactions"
            );
        }
        removed_ids.len()
    }

    /// Returns the cancellation token for a thread, creating it on first
    /// access. The graph engine clones this token and checks it at its own
    /// scheduling points.
    pub async fn thread_token(&self, thread_id: &str) -> CancellationToken {
        self.threads
            .lock()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .clone()
    }

    // ============================================================================
    // Internals
    // ============================================================================

    /// Registers the suspension, notifies the surface (or applies the
    /// policy), and awaits the decision.
    async fn await_decision(&self, request: InteractionRequest) -> Option<InteractionResponse> {
        let interaction_id = request.id.clone();

        let rx = match self.gate.register(&interaction_id).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(interaction_id, error = %e, "refusing duplicate suspension");
                return None;
            }
        };
        {
            let mut pending = self.pending.lock().await;
            pending.insert(interaction_id.clone(), request.clone());
        }

        // A programmatic decision short-circuits the UI round trip; the
        // surface still learns about it through interaction.resolved.
        let auto = self
            .policy
            .as_ref()
            .and_then(|policy| policy.auto_decision(&request));
        if let Some(approved) = auto {
            tracing::info!(interaction_id, approved, "interaction resolved by policy");
            let response = InteractionResponse::new(&interaction_id, approved);
            self.resolve(&interaction_id, response).await;
        } else {
            self.notify_request(&request).await;
        }

        match rx.await {
            Ok(response) => Some(response),
            Err(_) => {
                tracing::debug!(interaction_id, "suspension dropped without a response");
                None
            }
        }
    }

    /// Pushes a new request to the approval surface. Delivery failure is
    /// logged; the suspension stays pending.
    async fn notify_request(&self, request: &InteractionRequest) {
        let envelope = RequestEnvelope {
            interaction_id: request.id.clone(),
            request: request.clone(),
        };
        match serde_json::to_value(&envelope) {
            Ok(payload) => {
                if let Err(e) = self
                    .transport
                    .send(channels::INTERACTION_REQUEST, payload)
                    .await
                {
                    tracing::warn!(
                        interaction_id = %request.id,
                        error = %e,
                        "failed to push interaction request"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(interaction_id = %request.id, error = %e, "failed to serialize interaction request");
            }
        }
    }

    /// Notifies the surface that an interaction finished processing.
    async fn notify_resolved(&self, interaction_id: &str, response: &InteractionResponse) {
        let envelope = ResolvedEnvelope {
            interaction_id: interaction_id.to_string(),
            response: response.clone(),
        };
        match serde_json::to_value(&envelope) {
            Ok(payload) => {
                if let Err(e) = self
                    .transport
                    .send(channels::INTERACTION_RESOLVED, payload)
                    .await
                {
                    tracing::warn!(interaction_id, error = %e, "failed to push resolution notice");
                }
            }
            Err(e) => {
                tracing::warn!(interaction_id, error = %e, "failed to serialize resolution notice");
            }
        }
    }
}
