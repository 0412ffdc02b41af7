//! Bounded validate → execute → repair state machine.
//!
//! A failed plan is flattened back to its abstract form, handed to the repair
//! collaborator together with the failure details, refined, re-mapped and run
//! through validation and execution again. The number of repair attempts never
//! exceeds the configured bound.

use crate::collaborators::{Collaborators, NO_RESPONSE_STATUS};
use crate::config::RepairConfig;
use crate::error::PlanError;
use crate::mapper::{PlanMapper, WirePlan};
use crate::session::log::SessionLog;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Why a plan did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Failure {
    Validation { errors: Vec<String> },
    Execution { status: u16, diagnostics: Value },
}

impl Failure {
    /// Execution diagnostics, if the plan got as far as the executor.
    pub fn execution_diagnostics(&self) -> Option<&Value> {
        match self {
            Failure::Execution { diagnostics, .. } => Some(diagnostics),
            Failure::Validation { .. } => None,
        }
    }

    /// Validation errors, empty for execution failures.
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Failure::Validation { errors } => errors,
            Failure::Execution { .. } => &[],
        }
    }

    pub fn to_plan_error(&self) -> PlanError {
        match self {
            Failure::Validation { errors } => PlanError::ValidationFailure(errors.clone()),
            Failure::Execution {
                status,
                diagnostics,
            } => PlanError::ExecutionFailure {
                status: *status,
                diagnostics: diagnostics.clone(),
            },
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_plan_error())
    }
}

/// States of the repair loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairState {
    Built,
    Validated,
    Executing,
    Succeeded,
    Failed(Failure),
    Repairing,
    Exhausted,
}

impl RepairState {
    pub fn name(&self) -> &'static str {
        match self {
            RepairState::Built => "built",
            RepairState::Validated => "validated",
            RepairState::Executing => "executing",
            RepairState::Succeeded => "succeeded",
            RepairState::Failed(Failure::Validation { .. }) => "failed(validation)",
            RepairState::Failed(Failure::Execution { .. }) => "failed(execution)",
            RepairState::Repairing => "repairing",
            RepairState::Exhausted => "exhausted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RepairState::Succeeded | RepairState::Exhausted)
    }
}

impl fmt::Display for RepairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal result of one controller run.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// [`RepairState::Succeeded`] or [`RepairState::Exhausted`].
    pub state: RepairState,
    /// Repair attempts performed.
    pub attempts: u32,
    /// 1 for the initial plan, +1 per repair attempt.
    pub plan_version: u32,
    /// The last plan validated or executed.
    pub final_plan: WirePlan,
    /// Execution result on success.
    pub result: Option<Value>,
    /// Last failure when exhausted.
    pub last_failure: Option<Failure>,
    /// Every state visited, in order.
    pub transitions: Vec<RepairState>,
}

impl RepairOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RepairState::Succeeded
    }

    /// The execution result, or [`PlanError::RepairExhausted`].
    pub fn into_result(self) -> Result<Value, PlanError> {
        match (self.state, self.result) {
            (RepairState::Succeeded, Some(result)) => Ok(result),
            _ => Err(PlanError::RepairExhausted {
                attempts: self.attempts,
                last_failure: self
                    .last_failure
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown failure".to_string()),
            }),
        }
    }
}

/// Drives one wire plan to success or exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairController {
    max_iterations: u32,
    enabled: bool,
}

impl Default for RepairController {
    fn default() -> Self {
        Self::from_config(&RepairConfig::default())
    }
}

impl RepairController {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            enabled: true,
        }
    }

    /// No repair: the first failure is terminal.
    pub fn disabled() -> Self {
        Self {
            max_iterations: 0,
            enabled: false,
        }
    }

    pub fn from_config(config: &RepairConfig) -> Self {
        if config.enabled {
            Self::new(config.max_iterations)
        } else {
            Self::disabled()
        }
    }

    /// Maximum repair attempts; 0 when repair is disabled.
    pub fn max_iterations(&self) -> u32 {
        if self.enabled {
            self.max_iterations
        } else {
            0
        }
    }

    /// Validate, execute and, on failure, repair `plan` until it succeeds or
    /// the attempt bound is reached.
    ///
    /// Failures of the repair or refine collaborators, and repaired plans that
    /// cannot be converted, end the run with an error.
    pub async fn run(
        &self,
        intent: &str,
        plan: WirePlan,
        mapper: &PlanMapper,
        collaborators: &Collaborators,
        log: &mut SessionLog,
    ) -> Result<RepairOutcome, PlanError> {
        let bound = self.max_iterations();
        let mut plan = plan;
        let mut attempts = 0u32;
        let mut plan_version = 1u32;
        let mut transitions = vec![RepairState::Built];

        loop {
            let failure = match self.check(&plan, collaborators, log, plan_version).await {
                Some(failure) => failure,
                None => {
                    transitions.push(RepairState::Validated);
                    transitions.push(RepairState::Executing);
                    match self.execute(&plan, collaborators, log, plan_version).await {
                        Ok(result) => {
                            transitions.push(RepairState::Succeeded);
                            info!(attempts, plan_version, "Plan executed successfully");
                            return Ok(RepairOutcome {
                                state: RepairState::Succeeded,
                                attempts,
                                plan_version,
                                final_plan: plan,
                                result: Some(result),
                                last_failure: None,
                                transitions,
                            });
                        }
                        Err(failure) => failure,
                    }
                }
            };

            transitions.push(RepairState::Failed(failure.clone()));

            if attempts >= bound {
                transitions.push(RepairState::Exhausted);
                warn!(attempts, max_iterations = bound, failure = %failure, "Repair exhausted");
                return Ok(RepairOutcome {
                    state: RepairState::Exhausted,
                    attempts,
                    plan_version,
                    final_plan: plan,
                    result: None,
                    last_failure: Some(failure),
                    transitions,
                });
            }

            transitions.push(RepairState::Repairing);
            attempts += 1;
            plan_version += 1;
            info!(attempt = attempts, max_iterations = bound, "Repairing plan");

            plan = self
                .repair(intent, &plan, &failure, mapper, collaborators, log, plan_version)
                .await?;
        }
    }

    /// Static validation; `None` when the plan passes.
    async fn check(
        &self,
        plan: &WirePlan,
        collaborators: &Collaborators,
        log: &mut SessionLog,
        plan_version: u32,
    ) -> Option<Failure> {
        let errors = match collaborators.validator.validate(plan).await {
            Ok(report) => report.errors,
            Err(e) => vec![format!("Validator failed: {}", e)],
        };
        log.record(
            "Validation",
            json!({ "plan_version": plan_version, "errors": errors }),
        );

        if errors.is_empty() {
            debug!(plan_version, "Plan validated");
            None
        } else {
            debug!(plan_version, errors = errors.len(), "Plan failed validation");
            Some(Failure::Validation { errors })
        }
    }

    async fn execute(
        &self,
        plan: &WirePlan,
        collaborators: &Collaborators,
        log: &mut SessionLog,
        plan_version: u32,
    ) -> Result<Value, Failure> {
        let report = match collaborators.executor.execute(plan).await {
            Ok(report) => report,
            Err(e) => crate::collaborators::ExecutionReport::new(
                NO_RESPONSE_STATUS,
                Value::String(e.to_string()),
            ),
        };
        log.record(
            "Execution",
            json!({ "plan_version": plan_version, "status": report.status, "payload": report.payload }),
        );

        if report.success() {
            Ok(report.payload)
        } else {
            debug!(plan_version, status = report.status, "Plan execution failed");
            Err(Failure::Execution {
                status: report.status,
                diagnostics: report.payload,
            })
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn repair(
        &self,
        intent: &str,
        plan: &WirePlan,
        failure: &Failure,
        mapper: &PlanMapper,
        collaborators: &Collaborators,
        log: &mut SessionLog,
        plan_version: u32,
    ) -> Result<WirePlan, PlanError> {
        let failed = mapper.from_wire(plan)?;
        let candidate = collaborators
            .repair
            .debug(
                intent,
                &failed,
                failure.execution_diagnostics(),
                failure.validation_errors(),
            )
            .await?;
        log.record("Repair candidate", &candidate);

        let refined = collaborators.refiner.refine(intent, &candidate).await?;
        log.record("Refined plan", &refined);

        let (wire, report) = mapper.to_wire_with_report(&refined);
        if !report.is_complete() {
            warn!(
                plan_version,
                unsupported = report.unsupported.len(),
                dropped = report.dropped.len(),
                "Repaired plan lost operators during mapping"
            );
        }
        log.record(
            "Wire plan",
            json!({ "plan_version": plan_version, "plan": wire, "mapping": report }),
        );
        Ok(wire)
    }
}
