//! Newest-wins merging of generated subplans

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use wayang_planner::steps::SubplanMerger;
use wayang_planner::{Operation, OperationCategory, Subplan};

/// Up to eight steps, each generating a handful of ids from a small pool so
/// that collisions are common.
fn subplans() -> impl Strategy<Value = Vec<Vec<u32>>> {
    proptest::collection::vec(proptest::collection::vec(1u32..16, 0..6), 1..8)
}

fn tagged(step: u32, ids: &[u32]) -> Subplan {
    Subplan::new(
        ids.iter()
            .map(|id| {
                let mut op = Operation::new(*id, OperationCategory::Unary, "map", vec![], vec![]);
                op.udf = Some(format!("step {}", step));
                op
            })
            .collect(),
    )
}

#[test]
fn merged_plan_has_unique_ids_owned_by_newest_step() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&subplans(), |generated| {
            let mut merger = SubplanMerger::new();
            let mut owner: HashMap<u32, u32> = HashMap::new();
            let queue: Vec<u32> = (1..=generated.len() as u32).collect();

            for (step, ids) in queue.iter().zip(&generated) {
                merger.accept(*step, tagged(*step, ids));
                for id in ids {
                    owner.insert(*id, *step);
                }
            }

            let graph = merger.merge(&queue);
            prop_assert!(graph.duplicate_ids().is_empty());

            let merged: HashSet<u32> = graph.ids().into_iter().collect();
            let expected: HashSet<u32> = owner.keys().copied().collect();
            prop_assert_eq!(merged, expected);

            for op in &graph.operations {
                let expected_udf = format!("step {}", owner[&op.id]);
                prop_assert_eq!(op.udf.as_deref(), Some(expected_udf.as_str()));
            }
            prop_assert_eq!(merger.operation_count(), graph.len());

            Ok(())
        })
        .unwrap();
}
