//! Infrastructure implementations for the Swarmgate workspace.
//!
//! Persistence, path management, configuration loading, the in-process
//! transport, and the composition root that wires a coordinator and an
//! approval surface from the on-disk configuration. The storage and
//! transport types implement traits declared in `swarmgate-core`.

pub mod bootstrap;
pub mod config_service;
pub mod json_artifact_repository;
pub mod local_transport;
pub mod paths;
pub mod telemetry;

pub use bootstrap::{RuntimeBuilder, SwarmgateRuntime};
pub use config_service::ConfigService;
pub use json_artifact_repository::JsonDirArtifactRepository;
pub use local_transport::LocalTransport;
pub use paths::SwarmPaths;
