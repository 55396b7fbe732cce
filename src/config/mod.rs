pub mod error;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::proposal::Capability;
use error::ConfigError;

/// File name searched for upward from the edited file
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Main configuration structure for trellis
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Distance between neighbouring order keys
    pub order_step: f64,

    /// How long a proposal poll waits for background work before showing the placeholder
    pub proposal_timeout_ms: u64,

    /// Prefix of generated accessor methods
    pub accessor_prefix: String,

    /// Capabilities of top-level types that receive accessors
    pub root_capabilities: Vec<String>,

    /// Log level: error, warn, info, debug, trace
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order_step: 10.0,
            proposal_timeout_ms: 100,
            accessor_prefix: "Get".to_string(),
            root_capabilities: vec!["form".to_string()],
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from trellis.toml, searching upward from `target_path`
    pub fn load(target_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = find_config_file(target_path.as_ref())
            .with_context(|| format!("Failed to find {}", CONFIG_FILE_NAME))?;

        Self::from_file(&config_path)
    }

    /// Load trellis.toml if one exists above `target_path`, otherwise fall back to defaults
    pub fn load_or_default(target_path: impl AsRef<Path>) -> Result<Self> {
        match find_config_file(target_path.as_ref()) {
            Ok(path) => Self::from_file(&path),
            Err(e) => {
                debug!("Using default configuration: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate a specific configuration file
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_data = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_data)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and capability names
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.order_step.is_finite() && self.order_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "'order_step' must be positive, got {}",
                self.order_step
            )));
        }
        if self.accessor_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "'accessor_prefix' must not be empty".to_string(),
            ));
        }
        for name in &self.root_capabilities {
            if name.parse::<Capability>().is_err() {
                return Err(ConfigError::UnknownCapability(name.clone()));
            }
        }
        Ok(())
    }

    /// Bounded wait used by proposal polling
    pub fn proposal_timeout(&self) -> Duration {
        Duration::from_millis(self.proposal_timeout_ms)
    }

    /// Parsed root capabilities; unknown names were rejected by `validate`
    pub fn root_capabilities(&self) -> Vec<Capability> {
        self.root_capabilities
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }
}

/// Find trellis.toml by searching upward from the given path
fn find_config_file(start_path: &Path) -> Result<PathBuf> {
    let current_dir = if start_path.is_file() {
        start_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Invalid file path"))?
    } else {
        start_path
    };

    let mut current_dir = current_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", current_dir.display()))?;

    loop {
        let config_path = current_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => break,
        }
    }

    Err(ConfigError::NotFound(start_path.display().to_string()).into())
}
