//! Interrupt mechanism for graph execution.
//!
//! Suspension is cooperative and single-shot: a node reaches a checkpoint,
//! registers a waiter keyed by the interaction id, and yields until a
//! resume value is injected. The surrounding code continues from that exact
//! point with the injected value as the checkpoint's result.
//!
//! Two representations of the suspension signal exist:
//!
//! - [`StepOutcome`]: the tagged result a node returns to the scheduler
//!   (`Completed` or `Suspended`). Preferred for engines that thread
//!   results up the call stack.
//! - [`GraphInterrupt`]: a dedicated error newtype for engines that
//!   propagate the signal as an error. It is detected by type identity,
//!   never by message matching, and intermediate layers must re-raise it
//!   unchanged; only the outermost scheduler parks it.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{Mutex, oneshot};

use swarmgate_core::interaction::{InteractionRequest, InteractionResponse};
use swarmgate_core::{Result, SwarmError};

/// Result of executing one graph step.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step finished and produced a value.
    Completed(serde_json::Value),
    /// The step suspended pending the given interaction.
    Suspended(InteractionRequest),
}

impl StepOutcome {
    /// Returns true if this outcome is a suspension.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }

    /// Returns the completed value, if any.
    pub fn completed(self) -> Option<serde_json::Value> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Suspended(_) => None,
        }
    }
}

/// Structural suspension signal for error-propagating engines.
///
/// Never catch-and-convert this anywhere except the outermost scheduler.
#[derive(Debug, Clone, Error)]
#[error("graph execution interrupted at interaction '{}'", .0.id)]
pub struct GraphInterrupt(pub InteractionRequest);

impl GraphInterrupt {
    /// Creates the signal for a suspension at `request`.
    pub fn new(request: InteractionRequest) -> Self {
        Self(request)
    }

    /// Returns the interaction this interrupt suspended on.
    pub fn request(&self) -> &InteractionRequest {
        &self.0
    }

    /// Detects the structural signal inside an `anyhow` error chain.
    ///
    /// Intermediate layers use this to re-raise the signal unchanged
    /// instead of swallowing it into a generic failure.
    pub fn find_in(err: &anyhow::Error) -> Option<&GraphInterrupt> {
        err.downcast_ref::<GraphInterrupt>()
    }
}

/// The suspension primitive: one live waiter per interaction id.
///
/// Registration and lookup each happen under a single lock acquisition with
/// no await in between, so two registrations for the same id cannot race
/// into a duplicate entry.
pub struct InterruptGate {
    waiters: Mutex<HashMap<String, oneshot::Sender<InteractionResponse>>>,
}

impl InterruptGate {
    /// Creates an empty gate.
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a suspension point for `interaction_id`.
    ///
    /// Returns the receiver that completes when the interaction is resumed.
    /// A second registration while a waiter is still live is rejected; it
    /// never silently replaces the existing waiter.
    pub async fn register(
        &self,
        interaction_id: &str,
    ) -> Result<oneshot::Receiver<InteractionResponse>> {
        let mut waiters = self.waiters.lock().await;
        if let Some(existing) = waiters.get(interaction_id)
            && !existing.is_closed()
        {
            return Err(SwarmError::internal(format!(
                "interaction '{}' already has a live waiter",
                interaction_id
            )));
        }
        let (tx, rx) = oneshot::channel();
        waiters.insert(interaction_id.to_string(), tx);
        Ok(rx)
    }

    /// Delivers the resume value for `interaction_id`.
    ///
    /// Returns false when no waiter exists (late or duplicate resume), or
    /// when the waiting side already went away.
    pub async fn resume(&self, interaction_id: &str, response: InteractionResponse) -> bool {
        let sender = { self.waiters.lock().await.remove(interaction_id) };
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Drops the waiter for `interaction_id` without resuming it.
    ///
    /// The suspended caller observes a closed channel and falls back to its
    /// conservative default result.
    pub async fn drop_waiter(&self, interaction_id: &str) -> bool {
        self.waiters.lock().await.remove(interaction_id).is_some()
    }

    /// Returns true if a live waiter exists for `interaction_id`.
    pub async fn is_waiting(&self, interaction_id: &str) -> bool {
        self.waiters
            .lock()
            .await
            .get(interaction_id)
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl Default for InterruptGate {
    fn default() -> Self {
        Self::new()
    }
}
