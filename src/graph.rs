//! Operator graph data model.
//!
//! Work steps come from the decomposition collaborator, operations from the
//! per-step generation collaborator. An [`OperationGraph`] is the ordered set
//! of live operations that gets mapped, validated and executed.

use crate::types::{OperationId, StepId, BOUNDARY_ID};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// One decomposed unit of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStep {
    #[serde(alias = "id")]
    pub step_id: StepId,

    /// Steps whose output this step consumes.
    #[serde(default, alias = "input")]
    pub depends_on: Vec<StepId>,

    /// Steps consuming this step's output. Informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<StepId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

impl WorkStep {
    pub fn new(step_id: StepId, depends_on: Vec<StepId>) -> Self {
        Self {
            step_id,
            depends_on,
            output: Vec::new(),
            step_description: None,
            expected_input: None,
            expected_output: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.step_description = Some(description.into());
        self
    }
}

/// Graph role of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationCategory {
    Input,
    Unary,
    Binary,
    Output,
}

impl OperationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCategory::Input => "input",
            OperationCategory::Unary => "unary",
            OperationCategory::Binary => "binary",
            OperationCategory::Output => "output",
        }
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the abstract operator graph.
///
/// Payload fields are only meaningful for some operators; the mapper decides
/// which of them reach the wire plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: OperationId,

    pub cat: OperationCategory,

    pub operator_name: String,

    #[serde(default, rename = "input")]
    pub input_ids: Vec<OperationId>,

    #[serde(default, rename = "output")]
    pub output_ids: Vec<OperationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_udf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub this_key_udf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub that_key_udf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_names: Vec<String>,
}

impl Operation {
    /// Bare operation with no payload.
    pub fn new(
        id: OperationId,
        cat: OperationCategory,
        operator_name: impl Into<String>,
        input_ids: Vec<OperationId>,
        output_ids: Vec<OperationId>,
    ) -> Self {
        Self {
            id,
            cat,
            operator_name: operator_name.into(),
            input_ids,
            output_ids,
            key_udf: None,
            udf: None,
            this_key_udf: None,
            that_key_udf: None,
            table: None,
            input_file_name: None,
            column_names: Vec::new(),
        }
    }
}

/// Operations attributed to one work step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subplan {
    pub operations: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
}

impl Subplan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            thoughts: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operation_ids(&self) -> HashSet<OperationId> {
        self.operations.iter().map(|op| op.id).collect()
    }
}

/// The ordered union of all live operations: the abstract plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationGraph {
    pub operations: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
}

impl OperationGraph {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            thoughts: None,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn ids(&self) -> Vec<OperationId> {
        self.operations.iter().map(|op| op.id).collect()
    }

    /// Ids that occur on more than one operation.
    pub fn duplicate_ids(&self) -> BTreeSet<OperationId> {
        let mut seen = HashSet::new();
        self.operations
            .iter()
            .filter(|op| !seen.insert(op.id))
            .map(|op| op.id)
            .collect()
    }

    /// Edge targets that name neither an operation in this graph nor the boundary.
    pub fn dangling_edges(&self) -> Vec<(OperationId, OperationId)> {
        let ids: HashSet<OperationId> = self.operations.iter().map(|op| op.id).collect();
        self.operations
            .iter()
            .flat_map(|op| {
                op.input_ids
                    .iter()
                    .chain(op.output_ids.iter())
                    .filter(|target| **target != BOUNDARY_ID && !ids.contains(target))
                    .map(move |target| (op.id, *target))
            })
            .collect()
    }
}

impl From<Subplan> for OperationGraph {
    fn from(subplan: Subplan) -> Self {
        Self {
            operations: subplan.operations,
            thoughts: subplan.thoughts,
        }
    }
}
