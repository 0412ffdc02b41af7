//! Loading entry points: layered workspace load and single-file load.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::PlannerConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Builds a [`PlannerConfig`] from its sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<PlannerConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: PlannerConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            providers = config.providers.len(),
            agents = config.agents.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Defaults, the given file, then environment. Other files are ignored.
    pub fn load_from_file(path: &Path) -> Result<PlannerConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Built-in defaults only.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> PlannerConfig {
        PlannerConfig::default()
    }
}
