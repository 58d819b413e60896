//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod config;
pub mod sample;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::Error;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Ls(args) => config::ls(&args),
        Commands::Get(args) => config::get(&args),
        Commands::Cp(args) => config::cp(&args),
        Commands::Rm(args) => config::rm(&args),
        Commands::Validate(args) => config::validate(&args, cli.quiet),
        Commands::Sample(args) => sample::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
