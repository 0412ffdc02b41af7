//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_build_plan, format_mapping_loss, to_pretty_json};
use crate::collaborators::{Collaborators, PlanExecutor, PlanValidator};
use crate::config::{ConfigLoader, PlannerConfig};
use crate::error::PlanError;
use crate::executor::HttpExecutor;
use crate::graph::{OperationGraph, WorkStep};
use crate::mapper::{PlanMapper, WirePlan};
use crate::session::{PlanSession, SessionStatus};
use crate::steps::BuildPlan;
use crate::validator::StructuralValidator;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Work steps as a bare list or wrapped in `{"steps": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StepsFile {
    List(Vec<WorkStep>),
    Wrapped { steps: Vec<WorkStep> },
}

impl StepsFile {
    fn into_steps(self) -> Vec<WorkStep> {
        match self {
            StepsFile::List(steps) | StepsFile::Wrapped { steps } => steps,
        }
    }
}

/// Runtime context for CLI execution: workspace and effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: PlannerConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PlanError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: PlannerConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PlanError> {
        info!(command = command_name(command), "Executing command");
        match command {
            Commands::Schedule { steps } => {
                let plan = BuildPlan::from_steps(&self.read_steps(steps)?)?;
                format_build_plan(&plan)
            }
            Commands::Map { plan, strict } => {
                let graph: OperationGraph = self.read_json(plan)?;
                let (wire, report) = self.mapper().to_wire_with_report(&graph);
                if *strict && !report.is_complete() {
                    return Err(PlanError::MalformedPlan(format!(
                        "{} operator(s) could not be mapped: {}",
                        report.lost(),
                        format_mapping_loss(&report).replace('\n', "; ")
                    )));
                }
                wire.to_json()
            }
            Commands::Unmap { plan } => {
                let graph = self.mapper().from_wire_str(&self.read_file(plan)?)?;
                to_pretty_json(&graph)
            }
            Commands::Validate { plan } => {
                let wire: WirePlan = self.read_json(plan)?;
                let report = block_on(StructuralValidator::new().validate(&wire))??;
                if report.success() {
                    Ok(format!("Plan is valid ({} operators)", wire.operators.len()))
                } else {
                    Err(PlanError::ValidationFailure(report.errors))
                }
            }
            Commands::Execute { plan } => {
                let wire: WirePlan = self.read_json(plan)?;
                let executor = HttpExecutor::from_config(&self.config.executor)?;
                let report = block_on(executor.execute(&wire))??;
                if report.success() {
                    to_pretty_json(&report.payload)
                } else {
                    Err(PlanError::ExecutionFailure {
                        status: report.status,
                        diagnostics: report.payload,
                    })
                }
            }
            Commands::Run {
                steps,
                intent,
                max_iterations,
                no_repair,
            } => {
                let steps = self.read_steps(steps)?;
                let mut config = self.config.clone();
                if let Some(max) = max_iterations {
                    config.repair.max_iterations = *max;
                }
                if *no_repair {
                    config.repair.enabled = false;
                }
                validate_config(&config)?;

                let collaborators = Collaborators::from_config(&config)?;
                let outcome = PlanSession::from_config(&config, collaborators)
                    .run_session_blocking(&steps, intent);
                match outcome.status {
                    SessionStatus::Succeeded => to_pretty_json(&outcome),
                    status => Err(PlanError::SessionFailed {
                        status: status.to_string(),
                        message: outcome.output,
                    }),
                }
            }
            Commands::Config { validate } => {
                if *validate {
                    validate_config(&self.config)?;
                    Ok("Configuration is valid".to_string())
                } else {
                    self.config.to_toml()
                }
            }
        }
    }

    fn mapper(&self) -> PlanMapper {
        PlanMapper::from_config(&self.config)
    }

    /// Relative paths are taken from the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn read_file(&self, path: &Path) -> Result<String, PlanError> {
        let path = self.resolve(path);
        debug!(path = %path.display(), "Reading input file");
        Ok(std::fs::read_to_string(&path)?)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, PlanError> {
        serde_json::from_str(&self.read_file(path)?).map_err(|e| {
            PlanError::MalformedPlan(format!("{}: {}", path.display(), e))
        })
    }

    fn read_steps(&self, path: &Path) -> Result<Vec<WorkStep>, PlanError> {
        let file: StepsFile = self.read_json(path)?;
        Ok(file.into_steps())
    }
}

fn validate_config(config: &PlannerConfig) -> Result<(), PlanError> {
    config.validate().map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        PlanError::ConfigError(format!("Configuration validation failed: {}", msgs.join("; ")))
    })
}

fn block_on<F: Future>(future: F) -> Result<F::Output, PlanError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
