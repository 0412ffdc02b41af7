//! Accumulation of per-step subplans into one operator graph.

use crate::graph::{Operation, OperationGraph, Subplan};
use crate::types::{OperationId, StepId};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Owns the subplans generated so far in one session.
///
/// An operation id always belongs to the most recently accepted subplan that
/// contains it, so the accumulated operations never share an id.
#[derive(Debug, Clone, Default)]
pub struct SubplanMerger {
    accumulated: IndexMap<StepId, Subplan>,
}

impl SubplanMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the subplan generated for `step_id`.
    ///
    /// Operations in older entries whose ids reappear in `subplan` are removed;
    /// entries left without operations are dropped. Any earlier entry for the
    /// same step is replaced.
    pub fn accept(&mut self, step_id: StepId, subplan: Subplan) {
        let subplan = dedupe_newest(subplan);
        let new_ids = subplan.operation_ids();

        let mut superseded = 0usize;
        self.accumulated.retain(|existing_step, existing| {
            let before = existing.operations.len();
            existing.operations.retain(|op| !new_ids.contains(&op.id));
            let removed = before - existing.operations.len();
            if removed > 0 {
                debug!(step_id, existing_step, removed, "Operations superseded");
            }
            superseded += removed;
            !existing.operations.is_empty()
        });

        debug!(
            step_id,
            operations = subplan.operations.len(),
            superseded,
            "Subplan accepted"
        );
        self.accumulated.insert(step_id, subplan);
    }

    /// Concatenate, in queue order, the operations of every accumulated step.
    /// Queue entries without a subplan are skipped.
    pub fn merge(&self, build_queue: &[StepId]) -> OperationGraph {
        let operations = build_queue
            .iter()
            .filter_map(|step_id| self.accumulated.get(step_id))
            .flat_map(|subplan| subplan.operations.iter().cloned())
            .collect();
        OperationGraph::new(operations)
    }

    /// Operations already built for the given dependency steps, in queue order.
    pub fn collect_context(
        &self,
        dependency_ids: &BTreeSet<StepId>,
        build_queue: &[StepId],
    ) -> Vec<Operation> {
        build_queue
            .iter()
            .filter(|step_id| dependency_ids.contains(*step_id))
            .filter_map(|step_id| self.accumulated.get(step_id))
            .flat_map(|subplan| subplan.operations.iter().cloned())
            .collect()
    }

    pub fn get(&self, step_id: StepId) -> Option<&Subplan> {
        self.accumulated.get(&step_id)
    }

    pub fn contains(&self, step_id: StepId) -> bool {
        self.accumulated.contains_key(&step_id)
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.accumulated.values().map(|s| s.operations.len()).sum()
    }

    pub fn into_inner(self) -> IndexMap<StepId, Subplan> {
        self.accumulated
    }
}

impl From<IndexMap<StepId, Subplan>> for SubplanMerger {
    fn from(accumulated: IndexMap<StepId, Subplan>) -> Self {
        Self { accumulated }
    }
}

/// A subplan repeating an id keeps the later operation, at the later position.
fn dedupe_newest(mut subplan: Subplan) -> Subplan {
    let mut seen: HashSet<OperationId> = HashSet::new();
    let mut kept: Vec<Operation> = Vec::with_capacity(subplan.operations.len());
    for op in subplan.operations.into_iter().rev() {
        if seen.insert(op.id) {
            kept.push(op);
        }
    }
    kept.reverse();
    subplan.operations = kept;
    subplan
}
