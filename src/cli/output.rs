//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::PlanError;

/// Map domain errors to a single line for CLI output.
pub fn map_error(e: &PlanError) -> String {
    e.to_string().lines().collect::<Vec<_>>().join(" ")
}
