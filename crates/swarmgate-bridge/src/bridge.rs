//! The approval surface itself.
//!
//! One `ApprovalBridge` lives on the UI side of the process boundary. It
//! listens on `interaction.request`, tracks each pending interaction,
//! materializes a durable approval artifact for it, and notifies the host
//! UI. The user's decision comes back through [`ApprovalBridge::submit_decision`],
//! which invokes `interaction.response` and finalizes the artifact.
//!
//! Delivery is at-least-once: a reconnect or replay can hand the bridge the
//! same request twice, and `sync_pending` re-fetches everything the
//! coordinator still holds. Materialization is therefore idempotent; the
//! artifact id is derived from the interaction id, so redundant deliveries
//! converge on one record.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;

use swarmgate_core::artifact::{ApprovalArtifact, ArtifactRepository, ArtifactStatus};
use swarmgate_core::interaction::{InteractionPayload, InteractionRequest};
use swarmgate_core::transport::{
    ListPendingQuery, ResolvedEnvelope, ResponseAck, ResponseEnvelope, Transport, channels,
};
use swarmgate_core::{Result, SwarmError};

use crate::decision::Decision;

/// Callback invoked when a new interaction needs the user's attention.
pub type InteractionNotifier = Arc<dyn Fn(InteractionRequest) + Send + Sync>;

/// Where one tracked interaction stands in its local lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    /// Arrived over the transport, nothing persisted yet.
    Received,
    /// A durable artifact exists for it.
    Materialized,
    /// Surfaced to the user, waiting for a decision.
    AwaitingDecision,
}

struct TrackedInteraction {
    request: InteractionRequest,
    phase: InteractionPhase,
    artifact_id: Option<String>,
}

/// UI-side bridge between the transport and the host UI.
pub struct ApprovalBridge {
    transport: Arc<dyn Transport>,
    repository: Arc<dyn ArtifactRepository>,
    /// Identifier stamped on artifacts this surface materializes.
    actor_id: String,
    tracked: Mutex<HashMap<String, TrackedInteraction>>,
    notifier: Option<InteractionNotifier>,
}

impl ApprovalBridge {
    /// Creates a bridge persisting artifacts through `repository`.
    pub fn new(
        transport: Arc<dyn Transport>,
        repository: Arc<dyn ArtifactRepository>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            repository,
            actor_id: actor_id.into(),
            tracked: Mutex::new(HashMap::new()),
            notifier: None,
        }
    }

    /// Installs the callback invoked for each newly tracked interaction.
    pub fn with_notifier(mut self, notifier: InteractionNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Registers the inbound handlers on the transport.
    ///
    /// Call once after construction; requests arriving before `attach`
    /// are picked up by the next [`sync_pending`](Self::sync_pending).
    pub fn attach(self: &Arc<Self>) {
        {
            let bridge = self.clone();
            self.transport.on(
                channels::INTERACTION_REQUEST,
                Arc::new(move |payload| {
                    let bridge = bridge.clone();
                    async move { bridge.handle_request(payload).await }.boxed()
                }),
            );
        }

        let bridge = self.clone();
        self.transport.on(
            channels::INTERACTION_RESOLVED,
            Arc::new(move |payload| {
                let bridge = bridge.clone();
                async move { bridge.handle_resolved(payload).await }.boxed()
            }),
        );
    }

    /// Submits the user's decision for a tracked interaction.
    ///
    /// Invokes `interaction.response`, finalizes the artifact from the
    /// decision, and stops tracking the interaction. When the ack reports
    /// the owning task complete, a result artifact is written as well.
    pub async fn submit_decision(
        &self,
        interaction_id: &str,
        decision: Decision,
    ) -> Result<ResponseAck> {
        // Capture the session up front: the resolution notice can race this
        // call and untrack the entry before the invoke returns.
        let session_id = {
            let tracked = self.tracked.lock().await;
            match tracked.get(interaction_id) {
                Some(entry) => entry.request.thread_id.clone(),
                None => return Err(SwarmError::not_found("interaction", interaction_id)),
            }
        };

        let approved = decision.approved;
        let envelope = ResponseEnvelope {
            interaction_id: interaction_id.to_string(),
            response: decision.into_response(interaction_id),
        };
        let reply = self
            .transport
            .invoke(channels::INTERACTION_RESPONSE, serde_json::to_value(&envelope)?)
            .await?;
        let ack: ResponseAck = serde_json::from_value(reply)?;

        self.finalize(interaction_id, approved).await;

        if ack.task_complete {
            let summary = ack
                .summary
                .clone()
                .unwrap_or_else(|| "Task completed".to_string());
            let result = ApprovalArtifact::task_result(session_id, &self.actor_id, summary);
            if let Err(e) = self.repository.save(&result).await {
                tracing::warn!(error = %e, "failed to persist task result artifact");
            }
        }

        Ok(ack)
    }

    /// Re-fetches the coordinator's pending interactions and tracks any the
    /// surface does not know about. Returns how many were newly tracked.
    ///
    /// Called on startup and after a reconnect, when pushed requests may
    /// have been missed.
    pub async fn sync_pending(&self, thread_id: Option<&str>) -> Result<usize> {
        let query = ListPendingQuery {
            thread_id: thread_id.map(str::to_string),
        };
        let reply = self
            .transport
            .invoke(channels::INTERACTION_LIST_PENDING, serde_json::to_value(&query)?)
            .await?;
        let pending: Vec<InteractionRequest> = serde_json::from_value(reply)?;

        let mut added = 0;
        for request in pending {
            if self.track_request(request).await {
                added += 1;
            }
        }
        if added > 0 {
            tracing::info!(added, "synced pending interactions");
        }
        Ok(added)
    }

    /// Returns the tracked interactions, oldest first.
    pub async fn tracked_interactions(&self) -> Vec<InteractionRequest> {
        let tracked = self.tracked.lock().await;
        let mut requests: Vec<InteractionRequest> = tracked
            .values()
            .map(|entry| entry.request.clone())
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        requests
    }

    /// Returns the local lifecycle phase of a tracked interaction.
    pub async fn phase_of(&self, interaction_id: &str) -> Option<InteractionPhase> {
        self.tracked
            .lock()
            .await
            .get(interaction_id)
            .map(|entry| entry.phase)
    }

    // ============================================================================
    // Inbound handlers
    // ============================================================================

    async fn handle_request(&self, payload: serde_json::Value) -> Result<serde_json::Value> {
        let request = match serde_json::from_value::<swarmgate_core::transport::RequestEnvelope>(
            payload,
        ) {
            Ok(envelope) => envelope.request,
            Err(e) => {
                tracing::warn!(error = %e, "malformed interaction request");
                return Ok(serde_json::json!({"received": false}));
            }
        };
        self.track_request(request).await;
        Ok(serde_json::json!({"received": true}))
    }

    async fn handle_resolved(&self, payload: serde_json::Value) -> Result<serde_json::Value> {
        let envelope = match serde_json::from_value::<ResolvedEnvelope>(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "malformed resolution notice");
                return Ok(serde_json::json!({"received": false}));
            }
        };

        // The interaction may have been resolved elsewhere (a policy, or
        // another surface). Reconcile local state to match.
        self.finalize(&envelope.interaction_id, envelope.response.approved)
            .await;
        Ok(serde_json::json!({"received": true}))
    }

    // ============================================================================
    // Internals
    // ============================================================================

    /// Tracks a request and materializes its artifact. Returns false when
    /// the request was already tracked (redundant delivery).
    async fn track_request(&self, request: InteractionRequest) -> bool {
        let interaction_id = request.id.clone();
        {
            let mut tracked = self.tracked.lock().await;
            if tracked.contains_key(&interaction_id) {
                tracing::debug!(interaction_id, "duplicate request delivery ignored");
                return false;
            }
            tracked.insert(
                interaction_id.clone(),
                TrackedInteraction {
                    request: request.clone(),
                    phase: InteractionPhase::Received,
                    artifact_id: None,
                },
            );
        }

        let artifact_id = match self.materialize(&request).await {
            Some(artifact_id) => {
                self.update_phase(&interaction_id, InteractionPhase::Materialized, Some(&artifact_id))
                    .await;
                Some(artifact_id)
            }
            None => None,
        };

        if let Some(notifier) = &self.notifier {
            notifier(request);
        }
        self.update_phase(&interaction_id, InteractionPhase::AwaitingDecision, artifact_id.as_deref())
            .await;
        true
    }

    /// Writes the durable artifact for a request, returning its id.
    ///
    /// Generic approvals leave no record unless their context names an
    /// agent execution (an `agent_id` field). Persistence is best-effort:
    /// a failed save is logged and the interaction proceeds without an
    /// artifact.
    async fn materialize(&self, request: &InteractionRequest) -> Option<String> {
        let artifact = match &request.payload {
            InteractionPayload::ToolApproval {
                tool_name,
                tool_arguments,
                ..
            } => ApprovalArtifact::pending(
                &request.id,
                &request.thread_id,
                &self.actor_id,
                &request.description,
            )
            .with_tool_call(tool_name, tool_arguments.clone()),
            InteractionPayload::Edit { instructions, .. } => ApprovalArtifact::pending(
                &request.id,
                &request.thread_id,
                &self.actor_id,
                instructions,
            ),
            InteractionPayload::Input { prompt, .. } => {
                ApprovalArtifact::pending(&request.id, &request.thread_id, &self.actor_id, prompt)
            }
            InteractionPayload::Approval { context } => {
                // Agent executions get a visible approval card; other generic
                // approvals are transient and leave no record.
                if context.get("agent_id").is_none() {
                    return None;
                }
                ApprovalArtifact::pending(
                    &request.id,
                    &request.thread_id,
                    &self.actor_id,
                    &request.description,
                )
            }
        };

        match self.repository.save(&artifact).await {
            Ok(()) => Some(artifact.id),
            Err(e) => {
                tracing::warn!(
                    interaction_id = %request.id,
                    error = %e,
                    "failed to persist approval artifact"
                );
                None
            }
        }
    }

    async fn update_phase(
        &self,
        interaction_id: &str,
        phase: InteractionPhase,
        artifact_id: Option<&str>,
    ) {
        let mut tracked = self.tracked.lock().await;
        if let Some(entry) = tracked.get_mut(interaction_id) {
            entry.phase = phase;
            if let Some(artifact_id) = artifact_id {
                entry.artifact_id = Some(artifact_id.to_string());
            }
        }
    }

    /// Stops tracking an interaction and moves its artifact to the final
    /// status. Idempotent: the decision path and the resolution notice both
    /// land here, whichever runs second finds nothing left to do.
    async fn finalize(&self, interaction_id: &str, approved: bool) {
        let entry = { self.tracked.lock().await.remove(interaction_id) };
        let Some(entry) = entry else {
            return;
        };

        if let Some(artifact_id) = &entry.artifact_id {
            let status = if approved {
                ArtifactStatus::Approved
            } else {
                ArtifactStatus::Denied
            };
            self.set_artifact_status(artifact_id, status).await;
        }
    }

    async fn set_artifact_status(&self, artifact_id: &str, status: ArtifactStatus) {
        match self.repository.find_by_id(artifact_id).await {
            Ok(Some(mut artifact)) => {
                artifact.status = status;
                if let Err(e) = self.repository.save(&artifact).await {
                    tracing::warn!(artifact_id, error = %e, "failed to update artifact status");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(artifact_id, error = %e, "failed to load artifact for status update");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use swarmgate_core::interaction::RiskLevel;
    use swarmgate_core::transport::{MessageHandler, RequestEnvelope};

    /// In-memory artifact store.
    struct MemoryRepository {
        artifacts: Mutex<HashMap<String, ApprovalArtifact>>,
    }

    impl MemoryRepository {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                artifacts: Mutex::new(HashMap::new()),
            })
        }

        async fn get(&self, artifact_id: &str) -> Option<ApprovalArtifact> {
            self.artifacts.lock().await.get(artifact_id).cloned()
        }

        async fn len(&self) -> usize {
            self.artifacts.lock().await.len()
        }
    }

    #[async_trait]
    impl ArtifactRepository for MemoryRepository {
        async fn find_by_id(&self, artifact_id: &str) -> Result<Option<ApprovalArtifact>> {
            Ok(self.artifacts.lock().await.get(artifact_id).cloned())
        }

        async fn save(&self, artifact: &ApprovalArtifact) -> Result<()> {
            self.artifacts
                .lock()
                .await
                .insert(artifact.id.clone(), artifact.clone());
            Ok(())
        }

        async fn delete(&self, artifact_id: &str) -> Result<()> {
            self.artifacts.lock().await.remove(artifact_id);
            Ok(())
        }

        async fn list_by_session(&self, session_id: &str) -> Result<Vec<ApprovalArtifact>> {
            let mut artifacts: Vec<ApprovalArtifact> = self
                .artifacts
                .lock()
                .await
                .values()
                .filter(|a| a.session_id == session_id)
                .cloned()
                .collect();
            artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(artifacts)
        }
    }

    /// Transport double answering invokes with canned replies.
    struct StubTransport {
        invoked: std::sync::Mutex<Vec<(String, serde_json::Value)>>,
        reply: std::sync::Mutex<serde_json::Value>,
    }

    impl StubTransport {
        fn new(reply: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                invoked: std::sync::Mutex::new(Vec::new()),
                reply: std::sync::Mutex::new(reply),
            })
        }

        fn invocations(&self) -> Vec<(String, serde_json::Value)> {
            self.invoked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, _channel: &str, _payload: serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn invoke(
            &self,
            channel: &str,
            payload: serde_json::Value,
        ) -> Result<serde_json::Value> {
            self.invoked
                .lock()
                .unwrap()
                .push((channel.to_string(), payload));
            Ok(self.reply.lock().unwrap().clone())
        }

        fn on(&self, _channel: &str, _handler: MessageHandler) {}
    }

    fn tool_request() -> InteractionRequest {
        InteractionRequest::tool_approval(
            "search_web",
            json!({"query": "foo"}),
            "Search the web",
            RiskLevel::Medium,
            "thread-1",
        )
    }

    fn envelope(request: &InteractionRequest) -> serde_json::Value {
        serde_json::to_value(RequestEnvelope {
            interaction_id: request.id.clone(),
            request: request.clone(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_request_is_tracked_and_materialized() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();

        assert_eq!(
            bridge.phase_of(&request.id).await,
            Some(InteractionPhase::AwaitingDecision)
        );
        let artifact = repository
            .get(&ApprovalArtifact::derived_id(&request.id))
            .await
            .expect("artifact persisted");
        assert_eq!(artifact.status, ArtifactStatus::Pending);
        assert_eq!(artifact.session_id, "thread-1");
        assert_eq!(artifact.tool_call.unwrap().name, "search_web");
    }

    #[tokio::test]
    async fn test_duplicate_delivery_converges_on_one_record() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();
        bridge.handle_request(envelope(&request)).await.unwrap();

        assert_eq!(bridge.tracked_interactions().await.len(), 1);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_generic_approval_leaves_no_artifact() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = InteractionRequest::approval(
            "Confirm",
            "Proceed with the plan?",
            json!({"plan": "steps"}),
            "thread-1",
        );
        bridge.handle_request(envelope(&request)).await.unwrap();

        // Tracked for a decision, but transient.
        assert_eq!(bridge.tracked_interactions().await.len(), 1);
        assert_eq!(repository.len().await, 0);
    }

    #[tokio::test]
    async fn test_agent_execution_approval_gets_a_visible_card() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = InteractionRequest::approval(
            "Run agent",
            "Execute the researcher agent",
            json!({"agent_id": "researcher"}),
            "thread-1",
        );
        bridge.handle_request(envelope(&request)).await.unwrap();

        let artifact = repository
            .get(&ApprovalArtifact::derived_id(&request.id))
            .await
            .expect("artifact persisted");
        assert_eq!(artifact.summary, "Execute the researcher agent");
        assert!(artifact.tool_call.is_none());
    }

    #[tokio::test]
    async fn test_submit_decision_finalizes_artifact() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport.clone(), repository.clone(), "ui");

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();

        let ack = bridge
            .submit_decision(&request.id, Decision::approve())
            .await
            .unwrap();
        assert!(ack.success);

        let invocations = transport.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, channels::INTERACTION_RESPONSE);

        assert!(bridge.tracked_interactions().await.is_empty());
        let artifact = repository
            .get(&ApprovalArtifact::derived_id(&request.id))
            .await
            .unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Approved);
    }

    #[tokio::test]
    async fn test_task_completion_writes_result_artifact() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({
            "success": true,
            "taskComplete": true,
            "summary": "all done",
        }));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();
        let ack = bridge
            .submit_decision(&request.id, Decision::approve())
            .await
            .unwrap();
        assert!(ack.task_complete);

        let artifacts = repository.list_by_session("thread-1").await.unwrap();
        assert_eq!(artifacts.len(), 2);
        let result = artifacts
            .iter()
            .find(|a| a.status == ArtifactStatus::Completed)
            .expect("result artifact");
        assert_eq!(result.summary, "all done");
    }

    #[tokio::test]
    async fn test_submit_decision_for_unknown_interaction_fails() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport.clone(), repository, "ui");

        let err = bridge
            .submit_decision("unknown", Decision::deny())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        // Nothing went over the wire.
        assert!(transport.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_resolution_notice_reconciles_local_state() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let bridge = ApprovalBridge::new(transport, repository.clone(), "ui");

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();

        // Resolved elsewhere, e.g. by a policy: the notice arrives without
        // this surface ever submitting a decision.
        let notice = serde_json::to_value(ResolvedEnvelope {
            interaction_id: request.id.clone(),
            response: swarmgate_core::interaction::InteractionResponse::new(&request.id, false),
        })
        .unwrap();
        bridge.handle_resolved(notice).await.unwrap();

        assert!(bridge.tracked_interactions().await.is_empty());
        let artifact = repository
            .get(&ApprovalArtifact::derived_id(&request.id))
            .await
            .unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Denied);
    }

    #[tokio::test]
    async fn test_sync_pending_tracks_only_unknown_requests() {
        let repository = MemoryRepository::new();
        let first = tool_request();
        let second = InteractionRequest::human_input("name?", json!({}), "thread-1");
        let transport = StubTransport::new(serde_json::to_value(vec![&first, &second]).unwrap());
        let bridge = ApprovalBridge::new(transport, repository, "ui");

        assert_eq!(bridge.sync_pending(Some("thread-1")).await.unwrap(), 2);
        // Everything already known: nothing new.
        assert_eq!(bridge.sync_pending(Some("thread-1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_notifier_sees_new_interactions() {
        let repository = MemoryRepository::new();
        let transport = StubTransport::new(json!({"success": true}));
        let notified: Arc<std::sync::Mutex<Vec<String>>> =
            Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = notified.clone();
        let bridge = ApprovalBridge::new(transport, repository, "ui").with_notifier(Arc::new(
            move |request| {
                sink.lock().unwrap().push(request.id);
            },
        ));

        let request = tool_request();
        bridge.handle_request(envelope(&request)).await.unwrap();
        bridge.handle_request(envelope(&request)).await.unwrap();

        assert_eq!(notified.lock().unwrap().as_slice(), [request.id.clone()]);
    }
}
