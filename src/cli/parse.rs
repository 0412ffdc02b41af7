//! CLI parse: clap types for the planner. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wayang planner CLI - dependency-ordered plan generation, mapping and repair
#[derive(Parser)]
#[command(name = "wayang-planner")]
#[command(about = "Build, map, validate, execute and repair Wayang operator plans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the dependency map and build queue for a list of work steps
    Schedule {
        /// JSON file with the work steps
        steps: PathBuf,
    },
    /// Map an abstract plan to the executor's wire format
    Map {
        /// JSON file with the abstract plan
        plan: PathBuf,
        /// Fail when any operator is unsupported or dropped
        #[arg(long)]
        strict: bool,
    },
    /// Convert a wire plan back to the abstract plan
    Unmap {
        /// JSON file with the wire plan
        plan: PathBuf,
    },
    /// Run the structural validator on a wire plan
    Validate {
        /// JSON file with the wire plan
        plan: PathBuf,
    },
    /// Send a wire plan to the configured executor
    Execute {
        /// JSON file with the wire plan
        plan: PathBuf,
    },
    /// Run a full planning session with the configured agents
    Run {
        /// JSON file with the work steps
        steps: PathBuf,
        /// The original request in natural language
        #[arg(long)]
        intent: String,
        /// Override repair.max_iterations
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Disable the repair loop
        #[arg(long)]
        no_repair: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Validate the configuration instead of printing it
        #[arg(long)]
        validate: bool,
    },
}
