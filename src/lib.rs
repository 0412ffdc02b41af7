//! Wayang Planner: dependency-ordered generation, mapping and bounded repair
//! of Wayang operator plans.
//!
//! Work steps are resolved into a build queue, each step's subplan is
//! generated and merged into one operator graph, and the graph is mapped to
//! the executor's wire format, validated, executed and repaired on failure.

pub mod agents;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod logging;
pub mod mapper;
pub mod provider;
pub mod repair;
pub mod session;
pub mod steps;
pub mod types;
pub mod validator;

pub use collaborators::Collaborators;
pub use config::PlannerConfig;
pub use error::{CycleError, PlanError};
pub use graph::{Operation, OperationCategory, OperationGraph, Subplan, WorkStep};
pub use mapper::{PlanMapper, WirePlan};
pub use repair::{RepairController, RepairOutcome, RepairState};
pub use session::{run_session, run_session_blocking, PlanSession, SessionOutcome, SessionStatus};
