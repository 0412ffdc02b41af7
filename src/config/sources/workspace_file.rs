//! Workspace config file source: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Selects the environment-specific workspace file.
pub const ENV_VAR: &str = "WAYANG_PLANNER_ENV";

const DEFAULT_ENV: &str = "development";

/// Layer `config/config.toml`, then `config/<WAYANG_PLANNER_ENV>.toml`, over
/// `builder`. Missing files are skipped.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let layers = [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ];

    Ok(layers.into_iter().fold(builder, |builder, path| {
        if path.exists() {
            debug!(config_path = %path.display(), "Workspace configuration layer");
            builder.add_source(File::from(path).required(false))
        } else {
            builder
        }
    }))
}
