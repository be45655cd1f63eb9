//! Approval artifact domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving deterministic artifact ids from interaction ids.
const ARTIFACT_NAMESPACE: Uuid = Uuid::from_u128(0x9f2d_4c1a_7b3e_4d58_a6c0_51e8_23b7_90f4);

/// Lifecycle status of an approval artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Surfaced, awaiting a decision.
    Pending,
    /// The user approved (or submitted) the interaction.
    Approved,
    /// The user denied (or cancelled) the interaction.
    Denied,
    /// Final result artifact for a completed task.
    Completed,
}

/// A serialized tool invocation attached to a tool approval artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the external tool.
    pub name: String,
    /// Arguments the tool would be invoked with.
    pub arguments: serde_json::Value,
}

/// A durable record of one surfaced interaction or task result.
///
/// The id is derived deterministically from the interaction id, so redundant
/// delivery of the same request (reconnect, replay) maps onto the same
/// record instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalArtifact {
    /// Deterministic identifier, derived from the interaction id.
    pub id: String,
    /// Id of the interaction this artifact represents.
    pub interaction_id: String,
    /// The session (thread) the interaction belongs to.
    pub session_id: String,
    /// Originating actor (the approval surface that materialized it).
    pub actor_id: String,
    /// Serialized tool invocation, present for tool approvals only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,
    /// Human-readable summary shown alongside the artifact.
    pub summary: String,
    /// Current lifecycle status.
    pub status: ArtifactStatus,
    /// Creation timestamp (ISO 8601 format).
    pub created_at: String,
    /// Timestamp the artifact was surfaced, if it was (ISO 8601 format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
}

impl ApprovalArtifact {
    /// Derives the deterministic artifact id for an interaction id.
    pub fn derived_id(interaction_id: &str) -> String {
        Uuid::new_v5(&ARTIFACT_NAMESPACE, interaction_id.as_bytes()).to_string()
    }

    /// Creates a pending artifact for a surfaced interaction.
    pub fn pending(
        interaction_id: impl Into<String>,
        session_id: impl Into<String>,
        actor_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let interaction_id = interaction_id.into();
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Self::derived_id(&interaction_id),
            interaction_id,
            session_id: session_id.into(),
            actor_id: actor_id.into(),
            tool_call: None,
            summary: summary.into(),
            status: ArtifactStatus::Pending,
            created_at: now.clone(),
            sent_at: Some(now),
        }
    }

    /// Creates the final result artifact for a completed task.
    ///
    /// The id is derived from the session id, so one task produces at most
    /// one result record.
    pub fn task_result(
        session_id: impl Into<String>,
        actor_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let session_id = session_id.into();
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Self::derived_id(&format!("result:{}", session_id)),
            interaction_id: String::new(),
            session_id,
            actor_id: actor_id.into(),
            tool_call: None,
            summary: summary.into(),
            status: ArtifactStatus::Completed,
            created_at: now.clone(),
            sent_at: Some(now),
        }
    }

    /// Attaches the serialized tool invocation.
    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.tool_call = Some(ToolInvocation {
            name: name.into(),
            arguments,
        });
        self
    }
}
