//! Coordinator configuration model.
//!
//! Loaded from `config.toml` by the infrastructure crate's `ConfigService`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a swarmgate deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Actor id recorded on artifacts materialized by the approval surface.
    pub actor_id: String,
    /// Override for the artifact storage directory.
    pub artifact_dir: Option<PathBuf>,
    /// Approval policy settings.
    pub approvals: ApprovalConfig,
}

/// Approval policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// When true, tool approvals with low risk are resolved programmatically
    /// without surfacing to the user.
    pub auto_approve_low_risk: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            actor_id: "swarmgate".to_string(),
            artifact_dir: None,
            approvals: ApprovalConfig::default(),
        }
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            auto_approve_low_risk: false,
        }
    }
}
