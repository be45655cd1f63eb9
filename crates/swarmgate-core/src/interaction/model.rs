//! Interaction request and response models.
//!
//! These types cross the process boundary between the coordinator (the
//! privileged side) and the approval surface (the UI side), so they are all
//! serde-serializable. The payload is a tagged union keyed by `kind` with
//! one concrete shape per interaction kind.

use serde::{Deserialize, Serialize};

/// Risk classification attached to a tool approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Discriminant for the interaction payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Generic approval of an arbitrary context object.
    Approval,
    /// Edit of a state snapshot, restricted to named fields.
    Edit,
    /// Free-text input from the user.
    Input,
    /// Approval gating execution of a named external tool.
    ToolApproval,
}

/// Kind-specific data carried by an interaction request.
///
/// Each variant is the complete payload for one interaction kind; there is
/// no loosely-typed field probing anywhere downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionPayload {
    /// Gate execution of a named external tool.
    ToolApproval {
        tool_name: String,
        tool_arguments: serde_json::Value,
        risk_level: RiskLevel,
        description: String,
    },
    /// Let the user edit a state snapshot before execution continues.
    Edit {
        current_state: serde_json::Value,
        editable_field_names: Vec<String>,
        instructions: String,
    },
    /// Ask the user for free-text input.
    Input {
        prompt: String,
        context: serde_json::Value,
    },
    /// Generic approval of an arbitrary context object.
    Approval { context: serde_json::Value },
}

impl InteractionPayload {
    /// Returns the kind discriminant for this payload.
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::ToolApproval { .. } => InteractionKind::ToolApproval,
            Self::Edit { .. } => InteractionKind::Edit,
            Self::Input { .. } => InteractionKind::Input,
            Self::Approval { .. } => InteractionKind::Approval,
        }
    }
}

/// One pending human-decision checkpoint.
///
/// Exactly one request exists per outstanding suspension point; the `id` is
/// unique process-wide for the lifetime of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRequest {
    /// Opaque unique identifier, stable for the lifetime of the interaction.
    pub id: String,
    /// Short human-readable summary.
    pub title: String,
    /// Longer human-readable description.
    pub description: String,
    /// Kind-specific payload.
    pub payload: InteractionPayload,
    /// Creation timestamp (ISO 8601 format).
    pub created_at: String,
    /// Identifier of the execution graph/session this interaction belongs to.
    pub thread_id: String,
}

impl InteractionRequest {
    fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        payload: InteractionPayload,
        thread_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            payload,
            created_at: chrono::Utc::now().to_rfc3339(),
            thread_id: thread_id.into(),
        }
    }

    /// Creates a tool approval request for the given tool invocation.
    pub fn tool_approval(
        tool_name: impl Into<String>,
        tool_arguments: serde_json::Value,
        description: impl Into<String>,
        risk_level: RiskLevel,
        thread_id: impl Into<String>,
    ) -> Self {
        let tool_name = tool_name.into();
        let description = description.into();
        Self::new(
            format!("Approve tool: {}", tool_name),
            description.clone(),
            InteractionPayload::ToolApproval {
                tool_name,
                tool_arguments,
                risk_level,
                description,
            },
            thread_id,
        )
    }

    /// Creates a state edit request over the given snapshot.
    pub fn state_edit(
        current_state: serde_json::Value,
        editable_field_names: Vec<String>,
        instructions: impl Into<String>,
        thread_id: impl Into<String>,
    ) -> Self {
        let instructions = instructions.into();
        Self::new(
            "Review and edit state",
            instructions.clone(),
            InteractionPayload::Edit {
                current_state,
                editable_field_names,
                instructions,
            },
            thread_id,
        )
    }

    /// Creates a free-text input request.
    pub fn human_input(
        prompt: impl Into<String>,
        context: serde_json::Value,
        thread_id: impl Into<String>,
    ) -> Self {
        let prompt = prompt.into();
        Self::new(
            "Input requested",
            prompt.clone(),
            InteractionPayload::Input { prompt, context },
            thread_id,
        )
    }

    /// Creates a generic approval request.
    pub fn approval(
        title: impl Into<String>,
        description: impl Into<String>,
        context: serde_json::Value,
        thread_id: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            description,
            InteractionPayload::Approval { context },
            thread_id,
        )
    }

    /// Returns the kind discriminant of this request's payload.
    pub fn kind(&self) -> InteractionKind {
        self.payload.kind()
    }
}

/// The human decision answering one interaction request.
///
/// A response is only meaningful while a matching pending request exists;
/// the coordinator treats late or duplicate responses as harmless no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    /// Id of the interaction request this answers.
    pub id: String,
    /// The boolean decision. For `edit`/`input` kinds this means
    /// "submitted" vs "cancelled".
    pub approved: bool,
    /// Edited state snapshot, populated only for `edit` interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_data: Option<serde_json::Value>,
    /// Free-text answer, populated only for `input` interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    /// Response timestamp (ISO 8601 format).
    pub responded_at: String,
}

impl InteractionResponse {
    /// Creates a response carrying only the boolean decision.
    pub fn new(id: impl Into<String>, approved: bool) -> Self {
        Self {
            id: id.into(),
            approved,
            edited_data: None,
            user_input: None,
            responded_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attaches an edited state snapshot.
    pub fn with_edited_data(mut self, edited_data: serde_json::Value) -> Self {
        self.edited_data = Some(edited_data);
        self
    }

    /// Attaches a free-text answer.
    pub fn with_user_input(mut self, user_input: impl Into<String>) -> Self {
        self.user_input = Some(user_input.into());
        self
    }
}
