//! Composition root for a single-process deployment.
//!
//! Builds both sides of the interaction protocol from the on-disk
//! configuration: loads `config.toml`, resolves the artifact directory
//! (honoring the configured override), constructs the coordinator with the
//! configured approval policy, and attaches an approval surface stamped
//! with the configured actor id. Host applications with their own IPC
//! layer pass their transport endpoints; tests use
//! [`LocalTransport::pair`](crate::LocalTransport::pair).

use std::path::Path;
use std::sync::Arc;

use swarmgate_bridge::{ApprovalBridge, InteractionNotifier};
use swarmgate_core::Result;
use swarmgate_core::config::CoordinatorConfig;
use swarmgate_core::transport::Transport;
use swarmgate_coordinator::{
    CompletionProbe, InteractionManager, LowRiskAutoApprove, register_interaction_handlers,
};

use crate::config_service::ConfigService;
use crate::json_artifact_repository::JsonDirArtifactRepository;
use crate::paths::SwarmPaths;

/// A fully wired coordinator plus approval surface.
pub struct SwarmgateRuntime {
    /// The configuration everything was built from.
    pub config: CoordinatorConfig,
    /// Privileged-side interaction registry.
    pub manager: Arc<InteractionManager>,
    /// UI-side approval surface, already attached to its transport.
    pub bridge: Arc<ApprovalBridge>,
    /// Artifact store backing the bridge.
    pub repository: Arc<JsonDirArtifactRepository>,
}

/// Builder for [`SwarmgateRuntime`].
pub struct RuntimeBuilder {
    base_dir: Option<std::path::PathBuf>,
    probe: Option<Arc<dyn CompletionProbe>>,
    notifier: Option<InteractionNotifier>,
}

impl RuntimeBuilder {
    /// Starts a builder using the platform config directory.
    pub fn new() -> Self {
        Self {
            base_dir: None,
            probe: None,
            notifier: None,
        }
    }

    /// Overrides the base directory (tests and sandboxed embedders).
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        self.base_dir = Some(base_dir.to_path_buf());
        self
    }

    /// Installs a task-completion probe for response acks.
    pub fn with_probe(mut self, probe: Arc<dyn CompletionProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Installs the UI notification callback on the bridge.
    pub fn with_notifier(mut self, notifier: InteractionNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wires both sides over the given transport endpoints.
    ///
    /// The coordinator registers its inbound handlers on
    /// `coordinator_transport` and pushes notifications through it; the
    /// bridge attaches to `ui_transport`.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact directory cannot be created or
    /// the base directory cannot be resolved.
    pub async fn build(
        self,
        coordinator_transport: Arc<dyn Transport>,
        ui_transport: Arc<dyn Transport>,
    ) -> Result<SwarmgateRuntime> {
        let paths = SwarmPaths::new(self.base_dir.as_deref())?;
        let config = ConfigService::new(paths.clone()).get_config();

        let artifact_dir = config
            .artifact_dir
            .clone()
            .unwrap_or_else(|| paths.artifacts_dir());
        let repository = Arc::new(JsonDirArtifactRepository::with_dir(artifact_dir).await?);

        let mut manager = InteractionManager::new(coordinator_transport.clone());
        if config.approvals.auto_approve_low_risk {
            tracing::info!("low-risk tool approvals resolve programmatically");
            manager = manager.with_policy(Arc::new(LowRiskAutoApprove));
        }
        let manager = Arc::new(manager);
        register_interaction_handlers(coordinator_transport.as_ref(), manager.clone(), self.probe);

        let mut bridge = ApprovalBridge::new(ui_transport, repository.clone(), &config.actor_id);
        if let Some(notifier) = self.notifier {
            bridge = bridge.with_notifier(notifier);
        }
        let bridge = Arc::new(bridge);
        bridge.attach();

        tracing::info!(actor_id = %config.actor_id, "swarmgate runtime ready");
        Ok(SwarmgateRuntime {
            config,
            manager,
            bridge,
            repository,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
