//! Build-queue ordering of work steps.

use crate::error::{CycleError, PlanError};
use crate::graph::WorkStep;
use crate::steps::dependency::{check_unique_steps, resolve, DependencyMap};
use crate::types::StepId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Step ids in the order they must be generated.
pub type BuildQueue = Vec<StepId>;

/// Linearize a dependency map so every step follows all of its dependencies.
///
/// Works on a copy of the map. When several steps are ready at once, the one
/// declared first wins, so the result is deterministic for a given input.
pub fn schedule(dependency_map: &DependencyMap) -> Result<BuildQueue, CycleError> {
    let mut working = dependency_map.clone();
    let mut queue = Vec::with_capacity(working.len());

    while !working.is_empty() {
        let ready = working
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(step_id, _)| *step_id);

        let Some(step_id) = ready else {
            return Err(unresolved(dependency_map, &working));
        };

        working.shift_remove(&step_id);
        for deps in working.values_mut() {
            deps.remove(&step_id);
        }

        debug!(step_id, position = queue.len(), "Step queued");
        queue.push(step_id);
    }

    Ok(queue)
}

fn unresolved(declared: &DependencyMap, working: &DependencyMap) -> CycleError {
    let missing: BTreeSet<StepId> = working
        .values()
        .flatten()
        .filter(|dep| !declared.contains_key(*dep))
        .copied()
        .collect();

    CycleError {
        remaining: working.keys().copied().collect(),
        missing: missing.into_iter().collect(),
    }
}

/// Resolved dependencies plus the queue derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    pub dependencies: DependencyMap,
    pub queue: BuildQueue,
}

impl BuildPlan {
    /// Resolve and schedule a list of work steps.
    pub fn from_steps(steps: &[WorkStep]) -> Result<Self, PlanError> {
        check_unique_steps(steps)?;
        let dependencies = resolve(steps);
        let queue = schedule(&dependencies)?;
        Ok(Self {
            dependencies,
            queue,
        })
    }

    /// Dependency set of one step; empty for unknown steps.
    pub fn dependencies_of(&self, step_id: StepId) -> BTreeSet<StepId> {
        self.dependencies
            .get(&step_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Check the queue against the dependency map: every step exactly once,
    /// every dependency strictly earlier.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.queue.len() != self.dependencies.len() {
            return Err(PlanError::InvalidSteps(format!(
                "Build queue length mismatch: expected {}, got {}",
                self.dependencies.len(),
                self.queue.len()
            )));
        }

        let mut positions = HashMap::with_capacity(self.queue.len());
        for (position, step_id) in self.queue.iter().enumerate() {
            if positions.insert(*step_id, position).is_some() {
                return Err(PlanError::InvalidSteps(format!(
                    "Step {} queued more than once",
                    step_id
                )));
            }
        }

        for (step_id, deps) in &self.dependencies {
            let Some(own) = positions.get(step_id) else {
                return Err(PlanError::InvalidSteps(format!(
                    "Step {} missing from build queue",
                    step_id
                )));
            };
            for dep in deps {
                match positions.get(dep) {
                    Some(dep_position) if dep_position < own => {}
                    _ => {
                        return Err(PlanError::InvalidSteps(format!(
                            "Step {} queued before its dependency {}",
                            step_id, dep
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}
