//! External collaborators consumed by a planning session.
//!
//! Each trait is one seam: generation of a step's subplan, static validation,
//! remote execution, debugging a failed plan and refining a candidate plan.
//! Sessions call them one at a time and never concurrently.

use crate::agents::{AgentRole, BuilderAgent, DebuggerAgent, LlmAgent, RefinerAgent};
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::executor::HttpExecutor;
use crate::graph::{Operation, OperationGraph, Subplan, WorkStep};
use crate::mapper::WirePlan;
use crate::validator::StructuralValidator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Status the executor returns for a successful run.
pub const SUCCESS_STATUS: u16 = 200;

/// Status recorded when the executor could not be reached at all.
pub const NO_RESPONSE_STATUS: u16 = 0;

/// Outcome of static validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a remote execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub status: u16,
    /// Result on success, diagnostics otherwise.
    pub payload: Value,
}

impl ExecutionReport {
    pub fn new(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }

    pub fn success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

/// Produces the operations for one work step.
#[async_trait]
pub trait Generator: Send + Sync {
    /// `context` holds the already-built operations of the step's dependencies.
    async fn generate(&self, step: &WorkStep, context: &[Operation]) -> Result<Subplan, PlanError>;

    /// Called once at the start of every session; drops per-request state.
    fn start_session(&self) {}
}

/// Static checks on a wire plan before it is sent for execution.
#[async_trait]
pub trait PlanValidator: Send + Sync {
    async fn validate(&self, plan: &WirePlan) -> Result<ValidationReport, PlanError>;
}

/// Runs a wire plan on the remote engine.
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn execute(&self, plan: &WirePlan) -> Result<ExecutionReport, PlanError>;
}

/// Proposes a corrected plan from a failed one.
#[async_trait]
pub trait RepairAgent: Send + Sync {
    async fn debug(
        &self,
        intent: &str,
        plan: &OperationGraph,
        execution_diagnostics: Option<&Value>,
        validation_errors: &[String],
    ) -> Result<OperationGraph, PlanError>;

    /// Called once at the start of every session; drops per-request state.
    fn start_session(&self) {}
}

/// Aligns a candidate plan with the request before mapping.
#[async_trait]
pub trait RefineAgent: Send + Sync {
    async fn refine(&self, intent: &str, plan: &OperationGraph) -> Result<OperationGraph, PlanError>;

    /// Called once at the start of every session; drops per-request state.
    fn start_session(&self) {}
}

/// Refiner that returns the plan unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRefiner;

#[async_trait]
impl RefineAgent for PassthroughRefiner {
    async fn refine(&self, _intent: &str, plan: &OperationGraph) -> Result<OperationGraph, PlanError> {
        Ok(plan.clone())
    }
}

/// Repair agent used when repair is switched off; never expected to be called.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRepair;

#[async_trait]
impl RepairAgent for DisabledRepair {
    async fn debug(
        &self,
        _intent: &str,
        _plan: &OperationGraph,
        _execution_diagnostics: Option<&Value>,
        _validation_errors: &[String],
    ) -> Result<OperationGraph, PlanError> {
        Err(PlanError::Collaborator("repair is disabled".to_string()))
    }
}

/// The full set of collaborators one session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn Generator>,
    pub validator: Arc<dyn PlanValidator>,
    pub executor: Arc<dyn PlanExecutor>,
    pub repair: Arc<dyn RepairAgent>,
    pub refiner: Arc<dyn RefineAgent>,
}

impl Collaborators {
    /// Provider-backed agents, the structural validator and the HTTP executor.
    ///
    /// `agents.builder` is required; `agents.debugger` only when repair is
    /// enabled. Without `agents.refiner` plans pass through unrefined.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, PlanError> {
        let agent = |role: AgentRole| -> Result<Option<LlmAgent>, PlanError> {
            config
                .agents
                .get(role.as_str())
                .map(|agent| LlmAgent::from_config(role, agent, &config.providers))
                .transpose()
        };
        let missing = |role: AgentRole| {
            PlanError::ConfigError(format!("agents.{} is not configured", role))
        };

        let generator = agent(AgentRole::Builder)?.ok_or_else(|| missing(AgentRole::Builder))?;

        let repair: Arc<dyn RepairAgent> = match agent(AgentRole::Debugger)? {
            Some(debugger) => Arc::new(DebuggerAgent::new(debugger)),
            None if config.repair.enabled => return Err(missing(AgentRole::Debugger)),
            None => Arc::new(DisabledRepair),
        };

        let refiner: Arc<dyn RefineAgent> = match agent(AgentRole::Refiner)? {
            Some(refiner) => Arc::new(RefinerAgent::new(refiner)),
            None => Arc::new(PassthroughRefiner),
        };

        Ok(Self {
            generator: Arc::new(BuilderAgent::new(generator)),
            validator: Arc::new(StructuralValidator::new()),
            executor: Arc::new(HttpExecutor::from_config(&config.executor)?),
            repair,
            refiner,
        })
    }

    /// Reset every conversational collaborator before a new request.
    pub fn start_session(&self) {
        self.generator.start_session();
        self.repair.start_session();
        self.refiner.start_session();
    }
}
