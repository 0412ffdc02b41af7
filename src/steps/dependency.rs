//! Transitive dependency resolution over work steps.

use crate::error::PlanError;
use crate::graph::WorkStep;
use crate::types::StepId;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Step id to every step it depends on, directly or transitively.
///
/// Keys keep the order in which steps were declared.
pub type DependencyMap = IndexMap<StepId, BTreeSet<StepId>>;

/// Compute the full transitive dependency set of every step.
///
/// Dependencies on undeclared steps are kept as-is; a cycle shows up as a step
/// that depends on itself. Both are left for the scheduler to reject.
pub fn resolve(steps: &[WorkStep]) -> DependencyMap {
    let direct: HashMap<StepId, &[StepId]> = steps
        .iter()
        .map(|step| (step.step_id, step.depends_on.as_slice()))
        .collect();

    steps
        .iter()
        .map(|step| (step.step_id, transitive_dependencies(&direct, step.step_id)))
        .collect()
}

/// Depth-first walk from `step_id`. `seen` is fresh per call.
fn transitive_dependencies(direct: &HashMap<StepId, &[StepId]>, step_id: StepId) -> BTreeSet<StepId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<StepId> = direct
        .get(&step_id)
        .map(|deps| deps.iter().rev().copied().collect())
        .unwrap_or_default();

    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = direct.get(&current) {
            stack.extend(next.iter().rev().filter(|dep| !seen.contains(*dep)));
        }
    }

    seen
}

/// Step ids must be unique within a session.
pub fn check_unique_steps(steps: &[WorkStep]) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    let duplicates: BTreeSet<StepId> = steps
        .iter()
        .filter(|step| !seen.insert(step.step_id))
        .map(|step| step.step_id)
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(PlanError::InvalidSteps(format!(
            "duplicate step ids {:?}",
            duplicates
        )))
    }
}
