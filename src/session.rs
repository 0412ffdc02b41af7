//! Planning sessions.
//!
//! A [`PlanSession`] owns everything one request needs: the subplan merger,
//! the mapper, the repair controller and the journal. Sessions share no state,
//! so independent sessions may run side by side.

pub mod log;

use crate::collaborators::Collaborators;
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::graph::WorkStep;
use crate::mapper::PlanMapper;
use crate::repair::{RepairController, RepairOutcome, RepairState};
use crate::steps::{BuildPlan, SubplanMerger};
use self::log::SessionLog;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Final status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Succeeded,
    Exhausted,
    Aborted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Exhausted => "exhausted",
            SessionStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What the caller gets back from [`PlanSession::run_session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    /// Execution result on success, otherwise a readable failure message.
    pub output: String,
    pub attempts: u32,
    pub plan_version: u32,
}

impl SessionOutcome {
    fn aborted(err: &PlanError) -> Self {
        Self {
            status: SessionStatus::Aborted,
            output: err.to_string(),
            attempts: 0,
            plan_version: 0,
        }
    }

    fn from_repair(outcome: RepairOutcome) -> Self {
        let attempts = outcome.attempts;
        let plan_version = outcome.plan_version;
        let status = if outcome.state == RepairState::Succeeded {
            SessionStatus::Succeeded
        } else {
            SessionStatus::Exhausted
        };
        let output = match outcome.into_result() {
            Ok(Value::String(text)) => text,
            Ok(value) => value.to_string(),
            Err(err) => err.to_string(),
        };
        Self {
            status,
            output,
            attempts,
            plan_version,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == SessionStatus::Succeeded
    }
}

/// One request's worth of planning state.
pub struct PlanSession {
    merger: SubplanMerger,
    mapper: PlanMapper,
    collaborators: Collaborators,
    controller: RepairController,
    session_dir: Option<PathBuf>,
    log: SessionLog,
}

impl PlanSession {
    pub fn new(mapper: PlanMapper, collaborators: Collaborators, controller: RepairController) -> Self {
        Self {
            merger: SubplanMerger::new(),
            mapper,
            collaborators,
            controller,
            session_dir: None,
            log: SessionLog::new(),
        }
    }

    /// Mapper, repair bound and journal directory taken from `config`.
    pub fn from_config(config: &PlannerConfig, collaborators: Collaborators) -> Self {
        Self::new(
            PlanMapper::from_config(config),
            collaborators,
            RepairController::from_config(&config.repair),
        )
        .with_session_dir(config.logging.session_dir.clone())
    }

    /// Write the journal into `dir` when the session ends.
    pub fn with_session_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.session_dir = dir;
        self
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn merger(&self) -> &SubplanMerger {
        &self.merger
    }

    /// Build, validate, execute and repair the plan for `steps`.
    ///
    /// Never fails: errors that stop the session are reported as
    /// [`SessionStatus::Aborted`] with a readable message.
    pub async fn run_session(&mut self, steps: &[WorkStep], intent: &str) -> SessionOutcome {
        self.collaborators.start_session();
        self.merger = SubplanMerger::new();
        self.log = SessionLog::new();
        self.log.record("Request", json!({ "intent": intent, "steps": steps }));

        let outcome = match self.run(steps, intent).await {
            Ok(repair) => SessionOutcome::from_repair(repair),
            Err(err) => {
                error!(error = %err, "Session aborted");
                SessionOutcome::aborted(&err)
            }
        };

        info!(
            status = %outcome.status,
            attempts = outcome.attempts,
            plan_version = outcome.plan_version,
            "Session finished"
        );
        self.log.record("Outcome", &outcome);
        self.write_journal();
        outcome
    }

    /// Blocking wrapper around [`PlanSession::run_session`].
    ///
    /// Builds its own runtime; inside an existing runtime the session is
    /// aborted instead, since nesting runtimes panics.
    pub fn run_session_blocking(&mut self, steps: &[WorkStep], intent: &str) -> SessionOutcome {
        if tokio::runtime::Handle::try_current().is_ok() {
            let err = PlanError::SessionFailed {
                status: SessionStatus::Aborted.to_string(),
                message: "called inside an async runtime; await run_session instead".to_string(),
            };
            warn!(error = %err, "Session not started");
            return SessionOutcome::aborted(&err);
        }
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.run_session(steps, intent)),
            Err(e) => SessionOutcome::aborted(&PlanError::Io(e)),
        }
    }

    async fn run(&mut self, steps: &[WorkStep], intent: &str) -> Result<RepairOutcome, PlanError> {
        let build_plan = BuildPlan::from_steps(steps)?;
        info!(steps = steps.len(), queue = ?build_plan.queue, "Build queue ready");
        self.log.record(
            "Build queue",
            json!({ "dependencies": build_plan.dependencies, "queue": build_plan.queue }),
        );

        for step_id in &build_plan.queue {
            let Some(step) = steps.iter().find(|s| s.step_id == *step_id) else {
                continue;
            };
            let context = self
                .merger
                .collect_context(&build_plan.dependencies_of(*step_id), &build_plan.queue);
            let subplan = self
                .collaborators
                .generator
                .generate(step, &context)
                .await
                .map_err(|e| match e {
                    PlanError::Generation { .. } => e,
                    other => PlanError::Generation {
                        step_id: *step_id,
                        message: other.to_string(),
                    },
                })?;
            info!(
                step_id,
                operations = subplan.operations.len(),
                context = context.len(),
                "Step generated"
            );
            self.log.record(
                "Subplan",
                json!({ "step_id": step_id, "subplan": subplan }),
            );
            self.merger.accept(*step_id, subplan);
        }

        let merged = self.merger.merge(&build_plan.queue);
        info!(operations = merged.len(), "Subplans merged");
        self.log.record("Merged plan", &merged);

        let refined = self.collaborators.refiner.refine(intent, &merged).await?;
        self.log.record("Refined plan", &refined);

        let (wire, report) = self.mapper.to_wire_with_report(&refined);
        if !report.is_complete() {
            warn!(
                unsupported = report.unsupported.len(),
                dropped = report.dropped.len(),
                "Operators lost during mapping"
            );
        }
        self.log.record(
            "Wire plan",
            json!({ "plan_version": 1, "plan": wire, "mapping": report }),
        );

        self.controller
            .run(intent, wire, &self.mapper, &self.collaborators, &mut self.log)
            .await
    }

    fn write_journal(&self) {
        let Some(dir) = &self.session_dir else {
            return;
        };
        match self.log.write_to_dir(dir) {
            Ok(path) => info!(path = %path.display(), "Session journal written"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to write session journal"),
        }
    }
}

/// Run one session with a fresh [`PlanSession`] built from `config`.
pub async fn run_session(
    steps: &[WorkStep],
    intent: &str,
    config: &PlannerConfig,
    collaborators: Collaborators,
) -> SessionOutcome {
    PlanSession::from_config(config, collaborators)
        .run_session(steps, intent)
        .await
}

/// Blocking form of [`run_session`].
pub fn run_session_blocking(
    steps: &[WorkStep],
    intent: &str,
    config: &PlannerConfig,
    collaborators: Collaborators,
) -> SessionOutcome {
    PlanSession::from_config(config, collaborators).run_session_blocking(steps, intent)
}
