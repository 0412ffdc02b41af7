//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalar defaults live here; section defaults come from the serde
/// attributes on the config types.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("repair.enabled", true)?
        .set_default("repair.max_iterations", 5)?
        .set_default("executor.timeout_secs", 300)
}
