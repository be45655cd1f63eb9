//! Approval artifact domain module.
//!
//! Artifacts are the durable, user-visible records the approval surface
//! materializes for interactions: tool-call records, approval messages and
//! final task results. Persistence is best-effort; the decision flow never
//! depends on it.
//!
//! # Module Structure
//!
//! - `model`: Artifact domain model (`ApprovalArtifact`, `ToolInvocation`,
//!   `ArtifactStatus`)
//! - `repository`: Repository trait for artifact persistence

mod model;
mod repository;

// Re-export public API
pub use model::{ApprovalArtifact, ArtifactStatus, ToolInvocation};
pub use repository::ArtifactRepository;
