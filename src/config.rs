//! Configuration System
//!
//! Layered configuration for the planner: data locations, the remote
//! executor, the repair loop, model providers, agents and logging. Files and
//! environment variables are merged by [`ConfigLoader`]; [`PlannerConfig::validate`]
//! reports every problem at once.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub use crate::agents::AgentConfig;
pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub repair: RepairConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Model provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Agent definitions, keyed by role (`builder`, `debugger`, `refiner`)
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where input operators read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdbc_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdbc_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdbc_password: Option<String>,
    /// Folder holding text inputs; either a filesystem path or a `file://` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_folder: Option<PathBuf>,
}

/// Where output operators write to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Must exist at mapping time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,
}

/// Repair loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default = "default_repair_enabled")]
    pub enabled: bool,

    /// Upper bound on repair attempts per session.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_repair_enabled() -> bool {
    true
}

fn default_max_iterations() -> u32 {
    5
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            enabled: default_repair_enabled(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Remote plan executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Platforms placed in the wire plan context.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    300
}

pub(crate) fn default_platforms() -> Vec<String> {
    vec!["java".to_string()]
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            timeout_secs: default_timeout_secs(),
            platforms: default_platforms(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String, String),
    Agent(String, String),
    Repair(String),
    Executor(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Agent(name, msg) => write!(f, "Agent '{}': {}", name, msg),
            ValidationError::Repair(msg) => write!(f, "Repair: {}", msg),
            ValidationError::Executor(msg) => write!(f, "Executor: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PlannerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        for (name, agent) in &self.agents {
            if let Err(e) = agent.validate(&self.providers) {
                errors.push(ValidationError::Agent(name.clone(), e));
            }
        }

        if self.repair.enabled && self.repair.max_iterations == 0 {
            errors.push(ValidationError::Repair(
                "max_iterations must be at least 1 when repair is enabled".to_string(),
            ));
        }

        if let Some(url) = &self.executor.server_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(ValidationError::Executor(format!(
                    "server_url must start with http:// or https://: {}",
                    url
                )));
            }
        }
        if self.executor.timeout_secs == 0 {
            errors.push(ValidationError::Executor(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Serialize the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, crate::error::PlanError> {
        toml::to_string_pretty(self).map_err(|e| crate::error::PlanError::ConfigError(e.to_string()))
    }
}
