//! Configuration service implementation.
//!
//! Loads the coordinator configuration from `config.toml` under the
//! swarmgate base directory and caches it to avoid repeated file I/O.

use std::sync::{Arc, RwLock};

use swarmgate_core::Result;
use swarmgate_core::config::CoordinatorConfig;

use crate::paths::SwarmPaths;

/// Configuration service that loads and caches the coordinator config.
///
/// The configuration is loaded lazily on first access. A missing file is
/// created with the defaults, so a fresh deployment starts with an
/// editable `config.toml` in place.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: SwarmPaths,
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<CoordinatorConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService over the given paths.
    pub fn new(paths: SwarmPaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// Load failures are logged and fall back to the defaults; callers
    /// always get a usable configuration.
    pub fn get_config(&self) -> CoordinatorConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load config, using defaults");
                CoordinatorConfig::default()
            }
        };

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    /// Loads the configuration from `config.toml`, creating the file with
    /// defaults when it does not exist.
    fn load_config(&self) -> Result<CoordinatorConfig> {
        let config_path = self.paths.config_file();

        if !config_path.exists() {
            let default_config = CoordinatorConfig::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, toml::to_string_pretty(&default_config)?)?;
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&content)?)
    }
}
