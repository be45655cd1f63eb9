//! End-to-end approval flows: coordinator and bridge on opposite ends of an
//! in-process transport pair, with file-backed artifacts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use swarmgate_bridge::{ApprovalBridge, Decision};
use swarmgate_core::artifact::{ApprovalArtifact, ArtifactRepository, ArtifactStatus};
use swarmgate_core::interaction::RiskLevel;
use swarmgate_core::transport::{ClearAck, Transport, channels};
use swarmgate_coordinator::{
    CompletionProbe, InteractionManager, LowRiskAutoApprove, register_interaction_handlers,
};
use swarmgate_infrastructure::{JsonDirArtifactRepository, LocalTransport, SwarmPaths};

struct CompleteAfterResume;

#[async_trait]
impl CompletionProbe for CompleteAfterResume {
    async fn task_completion(&self, _thread_id: &str) -> Option<String> {
        Some("All steps finished".to_string())
    }
}

struct Harness {
    manager: Arc<InteractionManager>,
    bridge: Arc<ApprovalBridge>,
    repository: Arc<JsonDirArtifactRepository>,
    ui_transport: Arc<LocalTransport>,
    _temp_dir: TempDir,
}

async fn harness(policy: bool, probe: bool) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let paths = SwarmPaths::new(Some(temp_dir.path())).unwrap();
    let repository = Arc::new(JsonDirArtifactRepository::new(&paths).await.unwrap());

    let (coordinator_transport, ui_transport) = LocalTransport::pair();

    let mut manager = InteractionManager::new(coordinator_transport.clone());
    if policy {
        manager = manager.with_policy(Arc::new(LowRiskAutoApprove));
    }
    let manager = Arc::new(manager);
    let probe: Option<Arc<dyn CompletionProbe>> = if probe {
        Some(Arc::new(CompleteAfterResume))
    } else {
        None
    };
    register_interaction_handlers(coordinator_transport.as_ref(), manager.clone(), probe);

    let bridge = Arc::new(ApprovalBridge::new(
        ui_transport.clone(),
        repository.clone(),
        "ui",
    ));
    bridge.attach();

    Harness {
        manager,
        bridge,
        repository,
        ui_transport,
        _temp_dir: temp_dir,
    }
}

async fn wait_until<F>(mut condition: F)
where
    F: AsyncFnMut() -> bool,
{
    for _ in 0..400 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_full_approve_cycle_with_result_artifact() {
    let h = harness(false, true).await;

    let task = {
        let manager = h.manager.clone();
        tokio::spawn(async move {
            manager
                .request_tool_approval(
                    "send_email",
                    json!({"to": "a@example.com"}),
                    "Send the drafted email",
                    RiskLevel::High,
                    "thread-1",
                )
                .await
        })
    };

    // The request travels over the transport and shows up on the bridge.
    wait_until(async || !h.bridge.tracked_interactions().await.is_empty()).await;
    let tracked = h.bridge.tracked_interactions().await;
    assert_eq!(tracked.len(), 1);
    let interaction_id = tracked[0].id.clone();

    let pending_artifact = h
        .repository
        .find_by_id(&ApprovalArtifact::derived_id(&interaction_id))
        .await
        .unwrap()
        .expect("pending artifact on disk");
    assert_eq!(pending_artifact.status, ArtifactStatus::Pending);
    assert_eq!(pending_artifact.tool_call.as_ref().unwrap().name, "send_email");

    let ack = h
        .bridge
        .submit_decision(&interaction_id, Decision::approve())
        .await
        .unwrap();
    assert!(ack.success);
    assert!(ack.task_complete);

    // The suspended caller resumed with the decision.
    assert!(task.await.unwrap());
    assert!(h.manager.pending_interactions(None).await.is_empty());
    assert!(h.bridge.tracked_interactions().await.is_empty());

    // The artifact was finalized and a task result written beside it.
    let artifacts = h.repository.list_by_session("thread-1").await.unwrap();
    assert_eq!(artifacts.len(), 2);
    assert!(
        artifacts
            .iter()
            .any(|a| a.status == ArtifactStatus::Approved)
    );
    assert!(
        artifacts
            .iter()
            .any(|a| a.status == ArtifactStatus::Completed && a.summary == "All steps finished")
    );
}

#[tokio::test]
async fn test_denied_tool_approval_resolves_false() {
    let h = harness(false, false).await;

    let task = {
        let manager = h.manager.clone();
        tokio::spawn(async move {
            manager
                .request_tool_approval(
                    "delete_files",
                    json!({"glob": "*"}),
                    "Delete everything",
                    RiskLevel::High,
                    "thread-1",
                )
                .await
        })
    };

    wait_until(async || !h.bridge.tracked_interactions().await.is_empty()).await;
    let interaction_id = h.bridge.tracked_interactions().await[0].id.clone();

    let ack = h
        .bridge
        .submit_decision(&interaction_id, Decision::deny())
        .await
        .unwrap();
    assert!(ack.success);
    assert!(!ack.task_complete);
    assert!(!task.await.unwrap());

    wait_until(async || {
        h.repository
            .find_by_id(&ApprovalArtifact::derived_id(&interaction_id))
            .await
            .unwrap()
            .is_some_and(|a| a.status == ArtifactStatus::Denied)
    })
    .await;
}

#[tokio::test]
async fn test_state_edit_round_trip_over_transport() {
    let h = harness(false, false).await;

    let task = {
        let manager = h.manager.clone();
        tokio::spawn(async move {
            manager
                .request_state_edit(
                    json!({"subject": "Draft"}),
                    vec!["subject".to_string()],
                    "Review the email subject",
                    "thread-1",
                )
                .await
        })
    };

    wait_until(async || !h.bridge.tracked_interactions().await.is_empty()).await;
    let interaction_id = h.bridge.tracked_interactions().await[0].id.clone();

    h.bridge
        .submit_decision(
            &interaction_id,
            Decision::approve().with_edits(json!({"subject": "Final"})),
        )
        .await
        .unwrap();

    assert_eq!(task.await.unwrap(), json!({"subject": "Final"}));
}

#[tokio::test]
async fn test_auto_approved_low_risk_never_reaches_the_surface() {
    let h = harness(true, false).await;

    let approved = h
        .manager
        .request_tool_approval(
            "read_file",
            json!({"path": "notes.md"}),
            "Read the notes",
            RiskLevel::Low,
            "thread-1",
        )
        .await;

    assert!(approved);
    // The surface never tracked anything and nothing was persisted.
    assert!(h.bridge.tracked_interactions().await.is_empty());
    assert!(
        h.repository
            .list_by_session("thread-1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_silent_approval_is_tracked_and_resolvable() {
    let h = harness(false, false).await;

    let task = {
        let manager = h.manager.clone();
        tokio::spawn(async move {
            manager
                .request_approval("Proceed?", "Continue with the plan", json!({}), "thread-1")
                .await
        })
    };

    wait_until(async || !h.bridge.tracked_interactions().await.is_empty()).await;
    let interaction_id = h.bridge.tracked_interactions().await[0].id.clone();

    // Invisible: no artifact was materialized for it.
    assert!(
        h.repository
            .find_by_id(&ApprovalArtifact::derived_id(&interaction_id))
            .await
            .unwrap()
            .is_none()
    );

    // Still resolvable through the normal decision path.
    let ack = h
        .bridge
        .submit_decision(&interaction_id, Decision::approve())
        .await
        .unwrap();
    assert!(ack.success);
    assert!(task.await.unwrap());
    assert!(h.bridge.tracked_interactions().await.is_empty());
    assert!(
        h.repository
            .list_by_session("thread-1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_sync_pending_recovers_missed_requests() {
    let temp_dir = TempDir::new().unwrap();
    let paths = SwarmPaths::new(Some(temp_dir.path())).unwrap();
    let repository = Arc::new(JsonDirArtifactRepository::new(&paths).await.unwrap());

    let (coordinator_transport, ui_transport) = LocalTransport::pair();
    let manager = Arc::new(InteractionManager::new(coordinator_transport.clone()));
    register_interaction_handlers(coordinator_transport.as_ref(), manager.clone(), None);

    // The request goes out before any surface is listening.
    let task = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .request_human_input("What is the project name?", json!({}), "thread-1")
                .await
        })
    };
    wait_until(async || !manager.pending_interactions(None).await.is_empty()).await;

    // A surface attaches late and catches up.
    let bridge = Arc::new(ApprovalBridge::new(ui_transport, repository, "ui"));
    bridge.attach();
    assert_eq!(bridge.sync_pending(None).await.unwrap(), 1);

    let interaction_id = bridge.tracked_interactions().await[0].id.clone();
    bridge
        .submit_decision(&interaction_id, Decision::approve().with_input("swarmgate"))
        .await
        .unwrap();

    assert_eq!(task.await.unwrap(), "swarmgate");
}

#[tokio::test]
async fn test_clear_over_transport_defaults_the_caller() {
    let h = harness(false, false).await;

    let task = {
        let manager = h.manager.clone();
        tokio::spawn(async move {
            manager
                .request_approval("Proceed?", "Continue the plan", json!({}), "thread-1")
                .await
        })
    };
    wait_until(async || !h.manager.pending_interactions(None).await.is_empty()).await;

    let reply = h
        .ui_transport
        .invoke(channels::INTERACTION_CLEAR, json!({"threadId": "thread-1"}))
        .await
        .unwrap();
    let ack: ClearAck = serde_json::from_value(reply).unwrap();
    assert!(ack.success);
    assert_eq!(ack.removed, 1);

    // The suspended caller falls back to the conservative default.
    assert!(!task.await.unwrap());
}
