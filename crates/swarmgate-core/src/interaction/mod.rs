//! Interaction domain module.
//!
//! An interaction is one human-decision checkpoint raised by an executing
//! task graph: the graph suspends, a request is surfaced to a person, and
//! the graph resumes with the captured decision.
//!
//! # Module Structure
//!
//! - `model`: Request/response domain models (`InteractionRequest`,
//!   `InteractionResponse`, `InteractionPayload`, `RiskLevel`)

mod model;

// Re-export public API
pub use model::{
    InteractionKind, InteractionPayload, InteractionRequest, InteractionResponse, RiskLevel,
};
