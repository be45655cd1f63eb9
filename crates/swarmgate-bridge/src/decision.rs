//! The user's decision as collected by the host UI.

use serde::{Deserialize, Serialize};

use swarmgate_core::interaction::InteractionResponse;

/// A decision for one pending interaction.
///
/// The host UI builds one of these from whatever widgets it renders and
/// hands it to the bridge; the bridge turns it into the wire-level
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The boolean decision. For edit/input interactions this means
    /// "submitted" vs "cancelled".
    pub approved: bool,
    /// Free-text answer for input interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    /// Edited state snapshot for edit interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_data: Option<serde_json::Value>,
}

impl Decision {
    /// An approval (or submission).
    pub fn approve() -> Self {
        Self {
            approved: true,
            user_input: None,
            edited_data: None,
        }
    }

    /// A denial (or cancellation).
    pub fn deny() -> Self {
        Self {
            approved: false,
            user_input: None,
            edited_data: None,
        }
    }

    /// Attaches a free-text answer.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    /// Attaches an edited state snapshot.
    pub fn with_edits(mut self, edited: serde_json::Value) -> Self {
        self.edited_data = Some(edited);
        self
    }

    /// Converts the decision into the wire-level response for
    /// `interaction_id`.
    pub fn into_response(self, interaction_id: &str) -> InteractionResponse {
        let mut response = InteractionResponse::new(interaction_id, self.approved);
        if let Some(input) = self.user_input {
            response = response.with_user_input(input);
        }
        if let Some(edited) = self.edited_data {
            response = response.with_edited_data(edited);
        }
        response
    }
}
