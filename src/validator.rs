//! Structural validation of wire plans.
//!
//! Catches what the executor would reject anyway (broken edges, arity, missing
//! payload) so that the repair loop gets precise, readable messages instead of
//! an opaque remote error.

use crate::collaborators::{PlanValidator, ValidationReport};
use crate::error::PlanError;
use crate::graph::OperationCategory;
use crate::mapper::{OperatorKind, WireOperator, WirePlan};
use crate::types::{OperationId, BOUNDARY_ID};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Built-in validator checking graph shape and operator payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }

    /// Every problem found, in operator order.
    pub fn check(&self, plan: &WirePlan) -> Vec<String> {
        let mut errors = Vec::new();

        if plan.operators.is_empty() {
            errors.push("Plan contains no operators".to_string());
            return errors;
        }

        let mut by_id: HashMap<OperationId, &WireOperator> = HashMap::new();
        for op in &plan.operators {
            if op.id == BOUNDARY_ID {
                errors.push(format!(
                    "Operator '{}' uses reserved id {}",
                    op.operator_name, BOUNDARY_ID
                ));
            }
            if by_id.insert(op.id, op).is_some() {
                errors.push(format!("Duplicate operator id {}", op.id));
            }
        }

        for op in &plan.operators {
            check_operator(op, &by_id, &mut errors);
        }

        let categories: HashSet<OperationCategory> = plan.operators.iter().map(|op| op.cat).collect();
        if !categories.contains(&OperationCategory::Input) {
            errors.push("Plan has no input operator".to_string());
        }
        if !categories.contains(&OperationCategory::Output) {
            errors.push("Plan has no output operator".to_string());
        }

        errors
    }
}

fn check_operator(
    op: &WireOperator,
    by_id: &HashMap<OperationId, &WireOperator>,
    errors: &mut Vec<String>,
) {
    let label = format!("Operator {} ({})", op.id, op.operator_name);

    match OperatorKind::from_name(&op.operator_name) {
        Some(kind) => {
            if kind.category() != op.cat {
                errors.push(format!(
                    "{}: category '{}' should be '{}'",
                    label,
                    op.cat,
                    kind.category()
                ));
            }
            for key in kind.required_data() {
                if op.data.get(*key).map_or(true, |value| value.is_null()) {
                    errors.push(format!("{}: missing data field '{}'", label, key));
                }
            }
        }
        None => errors.push(format!("{}: unknown operator name", label)),
    }

    let inputs = edges(&op.input);
    let outputs = edges(&op.output);

    let expected_inputs = match op.cat {
        OperationCategory::Input => 0,
        OperationCategory::Unary | OperationCategory::Output => 1,
        OperationCategory::Binary => 2,
    };
    if inputs.len() != expected_inputs {
        errors.push(format!(
            "{}: {} operator needs {} input(s), has {}",
            label,
            op.cat,
            expected_inputs,
            inputs.len()
        ));
    }
    if op.cat == OperationCategory::Output && !outputs.is_empty() {
        errors.push(format!("{}: output operator cannot have outputs", label));
    }
    if op.cat != OperationCategory::Output && outputs.is_empty() {
        errors.push(format!("{}: result is never consumed", label));
    }

    for source in &inputs {
        match by_id.get(source) {
            None => errors.push(format!("{}: input {} does not exist", label, source)),
            Some(upstream) if !upstream.output.contains(&op.id) => errors.push(format!(
                "{}: input {} does not list {} as output",
                label, source, op.id
            )),
            Some(_) => {}
        }
    }
    for target in &outputs {
        match by_id.get(target) {
            None => errors.push(format!("{}: output {} does not exist", label, target)),
            Some(downstream) if !downstream.input.contains(&op.id) => errors.push(format!(
                "{}: output {} does not list {} as input",
                label, target, op.id
            )),
            Some(_) => {}
        }
    }
}

/// Edges other than the plan boundary.
fn edges(ids: &[OperationId]) -> Vec<OperationId> {
    ids.iter().copied().filter(|id| *id != BOUNDARY_ID).collect()
}

#[async_trait]
impl PlanValidator for StructuralValidator {
    async fn validate(&self, plan: &WirePlan) -> Result<ValidationReport, PlanError> {
        Ok(ValidationReport::failed(self.check(plan)))
    }
}
