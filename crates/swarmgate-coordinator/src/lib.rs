//! Privileged-side coordination for human-in-the-loop agent graphs.
//!
//! This crate hosts the `InteractionManager` (the single authoritative
//! registry of pending human-interaction requests), the interrupt gate the
//! graph engine suspends on, the transport handler registration for the
//! `interaction.*` channels, approval policies, and a tracing layer that
//! streams coordinator events to a host UI.

pub mod event_layer;
pub mod handlers;
pub mod interrupt;
pub mod manager;
pub mod policy;

pub use handlers::{CompletionProbe, register_interaction_handlers};
pub use interrupt::{GraphInterrupt, InterruptGate, StepOutcome};
pub use manager::InteractionManager;
pub use policy::{ApprovalPolicy, LowRiskAutoApprove};
