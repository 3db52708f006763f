//! Injected read-only configuration.
//!
//! Configuration is loaded once at startup from a TOML file and passed into
//! the engine by reference; nothing here is mutated after load.

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// File consulted when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "federation.toml";

/// Top-level configuration for the resolution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Host this process runs on; drives replica locality ordering.
    #[serde(default = "default_local_host")]
    pub local_host: String,

    #[serde(default)]
    pub placement: PlacementConfig,
}

/// Placement policy knobs consumed by resource selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Ordered default-resource list for writes that name no destination.
    #[serde(default)]
    pub default_resources: Vec<String>,

    /// Resources that must never be offered as a destination.
    #[serde(default)]
    pub taboo_resources: Vec<String>,

    /// Enforce per-resource quota limits before offering a destination.
    #[serde(default)]
    pub enforce_quota: bool,

    /// Permit more than one replica of an object per resource; changes how
    /// physical moves reconcile against their destination.
    #[serde(default)]
    pub multi_copy_per_resource: bool,
}

impl PlacementConfig {
    pub fn is_taboo(&self, name: &str) -> bool {
        self.taboo_resources.iter().any(|t| t == name)
    }
}

fn default_local_host() -> String {
    "localhost".to_string()
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            local_host: default_local_host(),
            placement: PlacementConfig::default(),
        }
    }
}

impl FederationConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// no path is given, falling back to built-in defaults when the default
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly-named file is missing or
    /// unreadable, when the TOML fails to parse, or when validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                debug!(path = %path.display(), "loading configuration");
                let raw = fs::read_to_string(path)?;
                let config: Self =
                    toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
                config.validate()?;
                Ok(config)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(Some(default_path))
                } else {
                    debug!("no configuration file; using defaults");
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Validate cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "local_host".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        for name in &self.placement.default_resources {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: "placement.default_resources".to_string(),
                    message: "entries must not be empty".to_string(),
                });
            }
            if self.placement.is_taboo(name) {
                return Err(ConfigError::Validation {
                    field: "placement.default_resources".to_string(),
                    message: format!("'{}' is also on the taboo list", name),
                });
            }
        }
        Ok(())
    }
}
