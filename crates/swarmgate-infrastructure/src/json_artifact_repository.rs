//! File-per-record artifact repository.
//!
//! Directory structure:
//! ```text
//! base_dir/
//! └── artifacts/
//!     ├── <artifact-uuid-1>.json
//!     └── <artifact-uuid-2>.json
//! ```

use std::path::PathBuf;

use async_trait::async_trait;

use swarmgate_core::artifact::{ApprovalArtifact, ArtifactRepository};
use swarmgate_core::{Result, SwarmError};

use crate::paths::SwarmPaths;

/// JSON file-per-artifact repository.
///
/// Artifact ids are uuid-v5 strings derived from interaction ids, so a
/// filename is safe to build from the id directly.
pub struct JsonDirArtifactRepository {
    dir: PathBuf,
}

impl JsonDirArtifactRepository {
    /// Creates a repository under `paths`' artifact directory, creating the
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(paths: &SwarmPaths) -> Result<Self> {
        Self::with_dir(paths.artifacts_dir()).await
    }

    /// Creates a repository at an explicit directory, creating it if needed.
    ///
    /// Used when the configuration overrides the default artifact location.
    pub async fn with_dir(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwarmError::io(format!("failed to create artifact dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn artifact_path(&self, artifact_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", artifact_id))
    }
}

#[async_trait]
impl ArtifactRepository for JsonDirArtifactRepository {
    async fn find_by_id(&self, artifact_id: &str) -> Result<Option<ApprovalArtifact>> {
        match tokio::fs::read(self.artifact_path(artifact_id)).await {
            Ok(bytes) => {
                let artifact = serde_json::from_slice(&bytes)?;
                Ok(Some(artifact))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SwarmError::data_access(format!(
                "failed to read artifact '{}': {}",
                artifact_id, e
            ))),
        }
    }

    async fn save(&self, artifact: &ApprovalArtifact) -> Result<()> {
        let json = serde_json::to_vec_pretty(artifact)?;
        tokio::fs::write(self.artifact_path(&artifact.id), json)
            .await
            .map_err(|e| {
                SwarmError::data_access(format!("failed to save artifact '{}': {}", artifact.id, e))
            })
    }

    async fn delete(&self, artifact_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.artifact_path(artifact_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SwarmError::data_access(format!(
                "failed to delete artifact '{}': {}",
                artifact_id, e
            ))),
        }
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ApprovalArtifact>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| SwarmError::data_access(format!("failed to list artifacts: {}", e)))?;

        let mut artifacts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwarmError::data_access(format!("failed to list artifacts: {}", e)))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
                    continue;
                }
            };
            match serde_json::from_slice::<ApprovalArtifact>(&bytes) {
                Ok(artifact) if artifact.session_id == session_id => artifacts.push(artifact),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed artifact");
                }
            }
        }

        // Most recent first
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(artifacts)
    }
}
