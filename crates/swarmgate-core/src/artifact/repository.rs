//! Repository trait for artifact persistence.

use super::model::ApprovalArtifact;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence backend for approval artifacts.
///
/// Implementations live in the infrastructure crate. Writes are best-effort
/// from the caller's point of view: the approval surface logs and continues
/// when a save fails.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Finds an artifact by its deterministic id.
    async fn find_by_id(&self, artifact_id: &str) -> Result<Option<ApprovalArtifact>>;

    /// Saves (creates or replaces) an artifact.
    async fn save(&self, artifact: &ApprovalArtifact) -> Result<()>;

    /// Deletes an artifact. Deleting a missing artifact is not an error.
    async fn delete(&self, artifact_id: &str) -> Result<()>;

    /// Lists all artifacts belonging to one session, most recent first.
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ApprovalArtifact>>;
}
