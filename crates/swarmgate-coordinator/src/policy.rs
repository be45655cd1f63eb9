//! Programmatic approval policies.
//!
//! A policy can resolve an interaction without human involvement. Resolved
//! interactions still emit `interaction.resolved`, so the approval surface
//! reconciles its local state even though it never showed anything.

use swarmgate_core::interaction::{InteractionPayload, InteractionRequest, RiskLevel};

/// Decides whether an interaction can be resolved without a human.
pub trait ApprovalPolicy: Send + Sync {
    /// Returns the programmatic decision for `request`, if the policy has
    /// one. `None` means the request goes to a human.
    fn auto_decision(&self, request: &InteractionRequest) -> Option<bool>;
}

/// Approves tool invocations classified as low risk; everything else goes
/// to a human.
pub struct LowRiskAutoApprove;

impl ApprovalPolicy for LowRiskAutoApprove {
    fn auto_decision(&self, request: &InteractionRequest) -> Option<bool> {
        match &request.payload {
            InteractionPayload::ToolApproval {
                risk_level: RiskLevel::Low,
                ..
            } => Some(true),
            _ => None,
        }
    }
}
