//! CLI presentation: turn command results into printable text.

use crate::error::PlanError;
use crate::mapper::MappingReport;
use crate::steps::BuildPlan;
use serde::Serialize;
use serde_json::json;

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, PlanError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Dependency sets and queue as one JSON document.
pub fn format_build_plan(plan: &BuildPlan) -> Result<String, PlanError> {
    to_pretty_json(&json!({
        "dependencies": plan.dependencies,
        "queue": plan.queue,
    }))
}

/// One line per operator left out of a wire plan.
pub fn format_mapping_loss(report: &MappingReport) -> String {
    report
        .unsupported
        .iter()
        .map(|s| format!("unsupported: operation {} ({})", s.operation_id, s.operator_name))
        .chain(report.dropped.iter().map(|s| {
            format!(
                "dropped: operation {} ({}): {}",
                s.operation_id, s.operator_name, s.reason
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
