//! Unified path management for swarmgate storage.
//!
//! All configuration and artifact data lives under one base directory:
//!
//! ```text
//! ~/.config/swarmgate/         # Base directory (platform config dir)
//! ├── config.toml              # Coordinator configuration
//! └── artifacts/               # Approval artifacts (file-per-record JSON)
//! ```
//!
//! Tests pass an explicit base directory to stay out of the real home.

use std::path::{Path, PathBuf};

use swarmgate_core::{Result, SwarmError};

const APP_DIR: &str = "swarmgate";

/// Resolved storage locations for one swarmgate deployment.
#[derive(Debug, Clone)]
pub struct SwarmPaths {
    base: PathBuf,
}

impl SwarmPaths {
    /// Creates a path set rooted at `base_dir`, or at the platform config
    /// directory when `None`.
    ///
    /// # Errors
    ///
    /// Returns a config error when no base directory is given and the
    /// platform config directory cannot be determined.
    pub fn new(base_dir: Option<&Path>) -> Result<Self> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or_else(|| SwarmError::config("cannot determine config directory"))?
                .join(APP_DIR),
        };
        Ok(Self { base })
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Returns the path to the configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    /// Returns the artifact storage directory.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.base.join("artifacts")
    }
}
