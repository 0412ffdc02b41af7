//! Identifier types shared across the planner.

/// Identifier of a decomposed work step. Unique within one session.
pub type StepId = u32;

/// Identifier of an operator in a plan. Unique within one plan.
///
/// `0` is reserved as the plan boundary and never names a real operator.
pub type OperationId = u32;

/// The reserved boundary id.
pub const BOUNDARY_ID: OperationId = 0;
