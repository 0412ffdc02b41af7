//! Plan Mapper
//!
//! Translates between the abstract operator graph and the executor's wire
//! format. `to_wire` nests operator payloads under `data` and derives the
//! executor-specific values (projection queries, file URIs, credentials);
//! `from_wire` flattens them back and undoes the derivations so a failed plan
//! can be handed to a repair collaborator.

pub mod operators;
pub mod paths;

use crate::config::{InputConfig, OutputConfig, PlannerConfig};
use crate::error::PlanError;
use crate::graph::{OperationCategory, OperationGraph};
use crate::types::OperationId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use operators::{OperatorKind, GLOBAL_REDUCE_KEY_UDF};

/// Fields of the abstract operation shape kept when flattening wire operators.
const OPERATION_FIELDS: &[&str] = &[
    "id",
    "cat",
    "input",
    "output",
    "operatorName",
    "keyUdf",
    "udf",
    "thisKeyUdf",
    "thatKeyUdf",
    "table",
    "inputFileName",
    "columnNames",
];

/// Execution environment descriptor of a wire plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireContext {
    pub platforms: Vec<String>,
    #[serde(default)]
    pub configuration: Map<String, Value>,
}

impl Default for WireContext {
    fn default() -> Self {
        Self {
            platforms: vec!["java".to_string()],
            configuration: Map::new(),
        }
    }
}

/// One executor-ready operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOperator {
    pub id: OperationId,
    pub cat: OperationCategory,
    #[serde(default)]
    pub input: Vec<OperationId>,
    #[serde(default)]
    pub output: Vec<OperationId>,
    pub operator_name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Plan in the executor's wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePlan {
    pub context: WireContext,
    pub operators: Vec<WireOperator>,
}

impl WirePlan {
    pub fn to_json(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<Value, PlanError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// An operator left out of the wire plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOperator {
    pub operation_id: OperationId,
    pub operator_name: String,
    pub reason: String,
}

/// What `to_wire` could not carry over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingReport {
    pub mapped: usize,
    /// Operator names outside the supported set.
    pub unsupported: Vec<SkippedOperator>,
    /// Supported operators whose preconditions were not met.
    pub dropped: Vec<SkippedOperator>,
}

impl MappingReport {
    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty() && self.dropped.is_empty()
    }

    pub fn lost(&self) -> usize {
        self.unsupported.len() + self.dropped.len()
    }

    pub fn unsupported_errors(&self) -> Vec<PlanError> {
        self.unsupported
            .iter()
            .map(|skipped| PlanError::UnsupportedOperator {
                operation_id: skipped.operation_id,
                operator_name: skipped.operator_name.clone(),
            })
            .collect()
    }
}

/// Sole translator between [`OperationGraph`] and [`WirePlan`].
#[derive(Debug, Clone, Default)]
pub struct PlanMapper {
    input: InputConfig,
    output: OutputConfig,
    context: WireContext,
}

impl PlanMapper {
    pub fn new(input: InputConfig, output: OutputConfig) -> Self {
        Self {
            input,
            output,
            context: WireContext::default(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.input.clone(), config.output.clone())
            .with_platforms(config.executor.platforms.clone())
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        if !platforms.is_empty() {
            self.context.platforms = platforms;
        }
        self
    }

    /// Map an abstract plan to the wire format, dropping what cannot be mapped.
    pub fn to_wire(&self, graph: &OperationGraph) -> WirePlan {
        self.to_wire_with_report(graph).0
    }

    /// Like [`PlanMapper::to_wire`], also reporting every operator left out.
    pub fn to_wire_with_report(&self, graph: &OperationGraph) -> (WirePlan, MappingReport) {
        let mut report = MappingReport::default();
        let mut operators = Vec::with_capacity(graph.len());

        for op in &graph.operations {
            let Some(kind) = OperatorKind::from_name(&op.operator_name) else {
                warn!(
                    operation_id = op.id,
                    operator_name = %op.operator_name,
                    "Unsupported operator skipped"
                );
                report.unsupported.push(SkippedOperator {
                    operation_id: op.id,
                    operator_name: op.operator_name.clone(),
                    reason: "operator not supported".to_string(),
                });
                continue;
            };

            if kind.category() != op.cat {
                debug!(
                    operation_id = op.id,
                    declared = %op.cat,
                    canonical = %kind.category(),
                    "Operator category corrected"
                );
            }

            match kind.shape(op, &self.input, &self.output) {
                Ok(wire) => operators.push(wire),
                Err(reason) => {
                    warn!(
                        operation_id = op.id,
                        operator_name = %op.operator_name,
                        reason = %reason,
                        "Operator dropped"
                    );
                    report.dropped.push(SkippedOperator {
                        operation_id: op.id,
                        operator_name: op.operator_name.clone(),
                        reason,
                    });
                }
            }
        }

        report.mapped = operators.len();
        let plan = WirePlan {
            context: self.context.clone(),
            operators,
        };
        (plan, report)
    }

    /// Convert a wire plan back to the abstract shape.
    pub fn from_wire(&self, plan: &WirePlan) -> Result<OperationGraph, PlanError> {
        self.from_wire_value(&plan.to_value()?)
    }

    /// Convert a serialized wire plan back to the abstract shape.
    pub fn from_wire_str(&self, plan: &str) -> Result<OperationGraph, PlanError> {
        let value: Value = serde_json::from_str(plan)
            .map_err(|e| PlanError::MalformedPlan(format!("not valid JSON: {}", e)))?;
        self.from_wire_value(&value)
    }

    /// Convert a parsed wire plan back to the abstract shape.
    pub fn from_wire_value(&self, plan: &Value) -> Result<OperationGraph, PlanError> {
        let object = plan
            .as_object()
            .ok_or_else(|| PlanError::MalformedPlan("plan is not an object".to_string()))?;
        let operators = object
            .get("operators")
            .ok_or_else(|| PlanError::MalformedPlan("missing 'operators'".to_string()))?
            .as_array()
            .ok_or_else(|| PlanError::MalformedPlan("'operators' is not a list".to_string()))?;

        let operations = operators
            .iter()
            .enumerate()
            .map(|(index, wire)| {
                let fields = flatten_operator(wire).map_err(|reason| {
                    PlanError::MalformedPlan(format!("operator {}: {}", index, reason))
                })?;
                serde_json::from_value(Value::Object(fields)).map_err(|e| {
                    PlanError::MalformedPlan(format!("operator {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut graph = OperationGraph::new(operations);
        graph.thoughts = Some("Plan converted from wire format".to_string());
        Ok(graph)
    }
}

/// Lift `data` to the top level, keep only abstract fields and undo derivations.
fn flatten_operator(wire: &Value) -> Result<Map<String, Value>, String> {
    let object = wire
        .as_object()
        .ok_or_else(|| "operator is not an object".to_string())?;

    let mut flat: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| key.as_str() != "data")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(data) = object.get("data") {
        let data = data
            .as_object()
            .ok_or_else(|| "'data' is not an object".to_string())?;
        flat.extend(data.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    let operator_name = flat.get("operatorName").and_then(Value::as_str).map(str::to_string);
    let kind = operator_name.as_deref().and_then(OperatorKind::from_name);

    let mut fields: Map<String, Value> = flat
        .iter()
        .filter(|(key, value)| OPERATION_FIELDS.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    match kind {
        Some(OperatorKind::TextFileInput) => {
            if let Some(filename) = flat.get("filename").and_then(Value::as_str) {
                fields.insert(
                    "inputFileName".to_string(),
                    Value::String(paths::logical_file_name(filename)),
                );
            }
        }
        Some(OperatorKind::JdbcRemoteInput) => {
            if let Some(table) = fields
                .get("table")
                .and_then(Value::as_str)
                .and_then(paths::table_from_projection)
            {
                fields.insert("table".to_string(), Value::String(table));
            }
        }
        Some(OperatorKind::Reduce) => {
            if fields.get("keyUdf").and_then(Value::as_str) == Some(GLOBAL_REDUCE_KEY_UDF) {
                fields.remove("keyUdf");
            }
        }
        _ => {}
    }

    Ok(fields)
}
