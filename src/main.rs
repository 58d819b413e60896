//! `conftree` - Inspect, convert and validate hierarchical configuration

use clap::Parser;

use conftree::cli::args::Cli;
use conftree::cli::commands;
use conftree::error::ExitCode;
use conftree::observability::{LogFormat, init_logging};

fn main() {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    init_logging(format, cli.verbose, cli.quiet, cli.color);

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
