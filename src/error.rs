//! Error types for the Wayang plan generation and repair pipeline.

use crate::types::StepId;
use thiserror::Error;

/// The build queue could not be completed: the remaining steps wait on each
/// other, or on steps that were never declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unresolvable step dependencies: steps {remaining:?} never became ready{}", missing_suffix(.missing))]
pub struct CycleError {
    /// Steps left in the working map when no ready step was found.
    pub remaining: Vec<StepId>,
    /// Step ids referenced as dependencies but not declared as steps.
    pub missing: Vec<StepId>,
}

fn missing_suffix(missing: &[StepId]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        format!(" (undeclared dependencies: {:?})", missing)
    }
}

/// Errors raised while planning, mapping, validating, executing or repairing a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Invalid work steps: {0}")]
    InvalidSteps(String),

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    #[error("Unsupported operator '{operator_name}' (operation {operation_id})")]
    UnsupportedOperator {
        operation_id: u32,
        operator_name: String,
    },

    #[error("Plan failed validation: {}", .0.join("; "))]
    ValidationFailure(Vec<String>),

    #[error("Plan execution failed with status {status}: {diagnostics}")]
    ExecutionFailure {
        status: u16,
        diagnostics: serde_json::Value,
    },

    #[error("Repair exhausted after {attempts} attempt(s): {last_failure}")]
    RepairExhausted { attempts: u32, last_failure: String },

    #[error("Session {status}: {message}")]
    SessionFailed { status: String, message: String },

    #[error("Generation failed for step {step_id}: {message}")]
    Generation { step_id: StepId, message: String },

    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for PlanError {
    fn from(err: config::ConfigError) -> Self {
        PlanError::ConfigError(err.to_string())
    }
}

impl PlanError {
    /// Validation and execution failures can be fed to the repair loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlanError::ValidationFailure(_) | PlanError::ExecutionFailure { .. }
        )
    }
}
