//! Shared test utilities: operation builders and scripted collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wayang_planner::collaborators::{
    Collaborators, ExecutionReport, Generator, PassthroughRefiner, PlanExecutor, PlanValidator,
    RefineAgent, RepairAgent, ValidationReport,
};
use wayang_planner::mapper::WirePlan;
use wayang_planner::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use wayang_planner::types::StepId;
use wayang_planner::{Operation, OperationCategory, OperationGraph, PlanError, Subplan, WorkStep};

pub fn op(
    id: u32,
    cat: OperationCategory,
    name: &str,
    input: Vec<u32>,
    output: Vec<u32>,
) -> Operation {
    Operation::new(id, cat, name, input, output)
}

pub fn map_op(id: u32, input: Vec<u32>, output: Vec<u32>, udf: &str) -> Operation {
    let mut op = op(id, OperationCategory::Unary, "map", input, output);
    op.udf = Some(udf.to_string());
    op
}

pub fn text_input(id: u32, output: Vec<u32>, file_name: &str) -> Operation {
    let mut op = op(id, OperationCategory::Input, "textFileInput", vec![], output);
    op.input_file_name = Some(file_name.to_string());
    op
}

pub fn text_output(id: u32, input: Vec<u32>) -> Operation {
    op(id, OperationCategory::Output, "textFileOutput", input, vec![])
}

/// Returns a fixed subplan per step id and records the context it was given.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub subplans: HashMap<StepId, Subplan>,
    pub calls: Mutex<Vec<(StepId, Vec<u32>)>>,
}

impl ScriptedGenerator {
    pub fn new(subplans: Vec<(StepId, Vec<Operation>)>) -> Arc<Self> {
        Arc::new(Self {
            subplans: subplans
                .into_iter()
                .map(|(step, ops)| (step, Subplan::new(ops)))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, step: &WorkStep, context: &[Operation]) -> Result<Subplan, PlanError> {
        self.calls
            .lock()
            .push((step.step_id, context.iter().map(|op| op.id).collect()));
        self.subplans
            .get(&step.step_id)
            .cloned()
            .ok_or_else(|| PlanError::Collaborator(format!("no subplan for step {}", step.step_id)))
    }
}

/// Pops scripted validation results; passes once the script runs out.
#[derive(Default)]
pub struct ScriptedValidator {
    pub results: Mutex<Vec<Result<Vec<String>, String>>>,
    pub calls: Mutex<u32>,
}

impl ScriptedValidator {
    pub fn new(results: Vec<Result<Vec<String>, String>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results),
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl PlanValidator for ScriptedValidator {
    async fn validate(&self, _plan: &WirePlan) -> Result<ValidationReport, PlanError> {
        *self.calls.lock() += 1;
        let mut results = self.results.lock();
        if results.is_empty() {
            return Ok(ValidationReport::passed());
        }
        match results.remove(0) {
            Ok(errors) => Ok(ValidationReport::failed(errors)),
            Err(message) => Err(PlanError::Collaborator(message)),
        }
    }
}

#[derive(Default)]
pub struct AlwaysFailingValidator {
    pub calls: Mutex<u32>,
}

#[async_trait]
impl PlanValidator for AlwaysFailingValidator {
    async fn validate(&self, _plan: &WirePlan) -> Result<ValidationReport, PlanError> {
        let mut calls = self.calls.lock();
        *calls += 1;
        Ok(ValidationReport::failed(vec![format!("validation run {}", calls)]))
    }
}

/// Pops scripted statuses (`None` = transport error); 200 once the script runs out.
#[derive(Default)]
pub struct ScriptedExecutor {
    pub statuses: Mutex<Vec<Option<u16>>>,
    pub plans: Mutex<Vec<WirePlan>>,
}

impl ScriptedExecutor {
    pub fn new(statuses: Vec<Option<u16>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses),
            plans: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PlanExecutor for ScriptedExecutor {
    async fn execute(&self, plan: &WirePlan) -> Result<ExecutionReport, PlanError> {
        self.plans.lock().push(plan.clone());
        let mut statuses = self.statuses.lock();
        let status = if statuses.is_empty() {
            Some(200)
        } else {
            statuses.remove(0)
        };
        match status {
            Some(200) => Ok(ExecutionReport::new(200, json!({"rows": plan.operators.len()}))),
            Some(status) => Ok(ExecutionReport::new(status, json!({"error": "remote failure"}))),
            None => Err(PlanError::Collaborator("connection refused".to_string())),
        }
    }
}

/// Records each debug call and returns the configured plan, or the input plan.
#[derive(Default)]
pub struct RecordingRepair {
    pub replacement: Option<OperationGraph>,
    pub calls: Mutex<Vec<RepairCall>>,
}

#[derive(Debug, Clone)]
pub struct RepairCall {
    pub intent: String,
    pub plan: OperationGraph,
    pub diagnostics: Option<Value>,
    pub validation_errors: Vec<String>,
}

impl RecordingRepair {
    pub fn echo() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replacing_with(plan: OperationGraph) -> Arc<Self> {
        Arc::new(Self {
            replacement: Some(plan),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RepairAgent for RecordingRepair {
    async fn debug(
        &self,
        intent: &str,
        plan: &OperationGraph,
        execution_diagnostics: Option<&Value>,
        validation_errors: &[String],
    ) -> Result<OperationGraph, PlanError> {
        self.calls.lock().push(RepairCall {
            intent: intent.to_string(),
            plan: plan.clone(),
            diagnostics: execution_diagnostics.cloned(),
            validation_errors: validation_errors.to_vec(),
        });
        Ok(self.replacement.clone().unwrap_or_else(|| plan.clone()))
    }
}

/// Counts refinements and tags the plan's thoughts.
#[derive(Default)]
pub struct CountingRefiner {
    pub calls: Mutex<u32>,
}

#[async_trait]
impl RefineAgent for CountingRefiner {
    async fn refine(&self, _intent: &str, plan: &OperationGraph) -> Result<OperationGraph, PlanError> {
        let mut calls = self.calls.lock();
        *calls += 1;
        let mut refined = plan.clone();
        refined.thoughts = Some(format!("refined {}", calls));
        Ok(refined)
    }
}

pub fn collaborators(
    generator: Arc<dyn Generator>,
    validator: Arc<dyn PlanValidator>,
    executor: Arc<dyn PlanExecutor>,
    repair: Arc<dyn RepairAgent>,
) -> Collaborators {
    Collaborators {
        generator,
        validator,
        executor,
        repair,
        refiner: Arc::new(PassthroughRefiner),
    }
}

/// Chat client that answers every request with the same reply and keeps the
/// message lists it was sent.
pub struct ScriptedChat {
    pub reply: String,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedChat {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, PlanError> {
        self.requests.lock().push(messages);
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: "scripted".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
