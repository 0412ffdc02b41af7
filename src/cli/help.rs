//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name recorded with each command's log events.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Schedule { .. } => "schedule",
        Commands::Map { .. } => "map",
        Commands::Unmap { .. } => "unmap",
        Commands::Validate { .. } => "validate",
        Commands::Execute { .. } => "execute",
        Commands::Run { .. } => "run",
        Commands::Config { .. } => "config",
    }
}
