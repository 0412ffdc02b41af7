//! Subplan accumulation across work steps

use crate::integration::test_utils::{map_op, op, text_input, text_output};
use std::collections::BTreeSet;
use wayang_planner::steps::{BuildPlan, SubplanMerger};
use wayang_planner::{OperationCategory, Subplan, WorkStep};

#[test]
fn newer_subplan_takes_over_shared_ids() {
    let mut merger = SubplanMerger::new();
    merger.accept(
        1,
        Subplan::new(vec![
            text_input(1, vec![2], "people"),
            map_op(2, vec![1], vec![], "p => p.name"),
        ]),
    );
    merger.accept(
        2,
        Subplan::new(vec![
            map_op(2, vec![1], vec![3], "p => p.name.toUpperCase"),
            map_op(3, vec![2], vec![], "n => n.trim"),
        ]),
    );

    assert_eq!(merger.get(1).unwrap().operations.len(), 1);
    assert_eq!(merger.get(1).unwrap().operations[0].id, 1);
    assert_eq!(merger.operation_count(), 3);

    let graph = merger.merge(&[1, 2]);
    assert_eq!(graph.ids(), vec![1, 2, 3]);
    assert_eq!(
        graph.get(2).unwrap().udf.as_deref(),
        Some("p => p.name.toUpperCase")
    );
    assert!(graph.duplicate_ids().is_empty());
}

#[test]
fn fully_superseded_step_disappears() {
    let mut merger = SubplanMerger::new();
    merger.accept(1, Subplan::new(vec![map_op(5, vec![], vec![], "x => x")]));
    merger.accept(2, Subplan::new(vec![map_op(5, vec![], vec![], "x => x + 1")]));

    assert!(!merger.contains(1));
    assert!(merger.contains(2));
    assert_eq!(merger.len(), 1);
    assert_eq!(merger.merge(&[1, 2]).ids(), vec![5]);
}

#[test]
fn merge_follows_queue_not_acceptance() {
    let mut merger = SubplanMerger::new();
    merger.accept(2, Subplan::new(vec![map_op(20, vec![10], vec![], "b")]));
    merger.accept(1, Subplan::new(vec![text_input(10, vec![20], "a")]));

    assert_eq!(merger.merge(&[1, 2]).ids(), vec![10, 20]);
    assert_eq!(merger.merge(&[2, 1]).ids(), vec![20, 10]);
}

#[test]
fn queue_entries_without_subplan_are_skipped() {
    let mut merger = SubplanMerger::new();
    merger.accept(3, Subplan::new(vec![text_output(7, vec![6])]));
    assert_eq!(merger.merge(&[1, 2, 3, 4]).ids(), vec![7]);
    assert!(SubplanMerger::new().merge(&[1, 2]).is_empty());
}

#[test]
fn context_holds_only_dependency_operations() {
    let steps = vec![
        WorkStep::new(1, vec![]),
        WorkStep::new(2, vec![]),
        WorkStep::new(3, vec![1]),
        WorkStep::new(4, vec![3]),
    ];
    let plan = BuildPlan::from_steps(&steps).unwrap();

    let mut merger = SubplanMerger::new();
    merger.accept(1, Subplan::new(vec![text_input(1, vec![3], "left")]));
    merger.accept(2, Subplan::new(vec![text_input(2, vec![], "right")]));
    merger.accept(3, Subplan::new(vec![map_op(3, vec![1], vec![], "l => l")]));

    let context = merger.collect_context(&plan.dependencies_of(4), &plan.queue);
    let ids: Vec<u32> = context.iter().map(|op| op.id).collect();
    assert_eq!(ids, vec![1, 3]);

    let none = merger.collect_context(&BTreeSet::new(), &plan.queue);
    assert!(none.is_empty());
}

#[test]
fn repeated_id_within_one_subplan_keeps_last() {
    let mut merger = SubplanMerger::new();
    merger.accept(
        1,
        Subplan::new(vec![
            op(4, OperationCategory::Unary, "filter", vec![], vec![]),
            op(5, OperationCategory::Unary, "map", vec![], vec![]),
            op(4, OperationCategory::Unary, "sort", vec![], vec![]),
        ]),
    );

    let graph = merger.merge(&[1]);
    assert_eq!(graph.ids(), vec![5, 4]);
    assert_eq!(graph.get(4).unwrap().operator_name, "sort");
}
