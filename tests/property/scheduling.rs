//! Build-queue properties over random dependency graphs

use proptest::prelude::*;
use std::collections::HashMap;
use wayang_planner::steps::BuildPlan;
use wayang_planner::{PlanError, WorkStep};

/// Random DAG: step `i` may depend on any step created before it, then the
/// declaration order is shuffled.
fn dag() -> impl Strategy<Value = Vec<WorkStep>> {
    (1usize..24)
        .prop_flat_map(|n| {
            let deps = (0..n)
                .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(4)))
                .collect::<Vec<_>>();
            (Just(n), deps)
        })
        .prop_map(|(n, deps)| {
            (0..n)
                .map(|i| {
                    let mut depends_on: Vec<u32> = deps[i]
                        .iter()
                        .filter(|d| **d < i)
                        .map(|d| (*d as u32) * 3 + 1)
                        .collect();
                    depends_on.sort_unstable();
                    depends_on.dedup();
                    WorkStep::new(i as u32 * 3 + 1, depends_on)
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

proptest! {
    #[test]
    fn queue_is_a_permutation_respecting_dependencies(steps in dag()) {
        let plan = BuildPlan::from_steps(&steps).unwrap();

        let mut queued = plan.queue.clone();
        queued.sort_unstable();
        let mut declared: Vec<u32> = steps.iter().map(|s| s.step_id).collect();
        declared.sort_unstable();
        prop_assert_eq!(queued, declared);

        let position: HashMap<u32, usize> =
            plan.queue.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for step in &steps {
            for dep in &step.depends_on {
                prop_assert!(position[dep] < position[&step.step_id]);
            }
        }
        prop_assert!(plan.validate().is_ok());
    }

    #[test]
    fn scheduling_is_deterministic(steps in dag()) {
        let first = BuildPlan::from_steps(&steps).unwrap();
        let second = BuildPlan::from_steps(&steps).unwrap();
        prop_assert_eq!(first.queue, second.queue);
    }

    #[test]
    fn back_edge_produces_cycle_error(steps in dag()) {
        // Close a loop between some step and one of its transitive dependencies.
        let plan = BuildPlan::from_steps(&steps).unwrap();
        let Some((late, deps)) = plan.dependencies.iter().find(|(_, deps)| !deps.is_empty()) else {
            return Ok(());
        };
        let (late, early) = (*late, *deps.iter().next().unwrap());

        let mut cyclic = steps.clone();
        for step in &mut cyclic {
            if step.step_id == early {
                step.depends_on.push(late);
            }
        }

        match BuildPlan::from_steps(&cyclic) {
            Err(PlanError::Cycle(err)) => {
                prop_assert!(err.remaining.contains(&late));
                prop_assert!(err.remaining.contains(&early));
                prop_assert!(err.missing.is_empty());
            }
            other => prop_assert!(false, "expected cycle, got {:?}", other.map(|p| p.queue)),
        }
    }
}
