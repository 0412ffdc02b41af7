//! Dependency resolution and build-queue ordering

use std::collections::BTreeSet;
use wayang_planner::steps::{resolve, schedule, BuildPlan};
use wayang_planner::{PlanError, WorkStep};

fn set(ids: &[u32]) -> BTreeSet<u32> {
    ids.iter().copied().collect()
}

#[test]
fn independent_steps_precede_their_join() {
    let steps = vec![
        WorkStep::new(1, vec![]),
        WorkStep::new(2, vec![]),
        WorkStep::new(3, vec![1, 2]),
    ];

    let dependencies = resolve(&steps);
    assert_eq!(dependencies[&1], set(&[]));
    assert_eq!(dependencies[&2], set(&[]));
    assert_eq!(dependencies[&3], set(&[1, 2]));

    let queue = schedule(&dependencies).unwrap();
    assert_eq!(queue, vec![1, 2, 3]);
}

#[test]
fn transitive_ancestors_are_included() {
    let steps = vec![
        WorkStep::new(4, vec![3]),
        WorkStep::new(3, vec![2]),
        WorkStep::new(2, vec![1]),
        WorkStep::new(1, vec![]),
    ];

    let dependencies = resolve(&steps);
    assert_eq!(dependencies[&4], set(&[1, 2, 3]));

    let plan = BuildPlan::from_steps(&steps).unwrap();
    assert_eq!(plan.queue, vec![1, 2, 3, 4]);
    plan.validate().unwrap();
}

#[test]
fn ties_follow_declaration_order() {
    let steps = vec![
        WorkStep::new(7, vec![]),
        WorkStep::new(2, vec![]),
        WorkStep::new(5, vec![]),
        WorkStep::new(1, vec![7, 5]),
    ];
    let plan = BuildPlan::from_steps(&steps).unwrap();
    assert_eq!(plan.queue, vec![7, 2, 5, 1]);
}

#[test]
fn cycle_is_reported_not_ordered() {
    let steps = vec![
        WorkStep::new(1, vec![]),
        WorkStep::new(2, vec![3]),
        WorkStep::new(3, vec![2]),
    ];

    let err = BuildPlan::from_steps(&steps).unwrap_err();
    match err {
        PlanError::Cycle(cycle) => {
            assert_eq!(cycle.remaining, vec![2, 3]);
            assert!(cycle.missing.is_empty());
        }
        other => panic!("expected cycle error, got {other}"),
    }
}

#[test]
fn undeclared_dependency_is_reported() {
    let steps = vec![WorkStep::new(1, vec![]), WorkStep::new(2, vec![9])];

    let err = schedule(&resolve(&steps)).unwrap_err();
    assert_eq!(err.remaining, vec![2]);
    assert_eq!(err.missing, vec![9]);
}

#[test]
fn duplicate_step_ids_are_rejected() {
    let steps = vec![WorkStep::new(1, vec![]), WorkStep::new(1, vec![])];
    assert!(matches!(
        BuildPlan::from_steps(&steps),
        Err(PlanError::InvalidSteps(_))
    ));
}

#[test]
fn steps_parse_from_decomposer_json() {
    let steps: Vec<WorkStep> = serde_json::from_str(
        r#"[
            {"id": 1, "input": [], "output": [2], "step_description": "Load people"},
            {"step_id": 2, "depends_on": [1], "expected_output": "names"}
        ]"#,
    )
    .unwrap();

    assert_eq!(steps[0].step_id, 1);
    assert_eq!(steps[0].step_description.as_deref(), Some("Load people"));
    assert_eq!(steps[1].depends_on, vec![1]);
    assert_eq!(BuildPlan::from_steps(&steps).unwrap().queue, vec![1, 2]);
}
