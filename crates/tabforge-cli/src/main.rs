//! Tabforge CLI - type detection, normalization and export for tabular files.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::LogConfig;

fn main() {
    let cli = Cli::parse();

    logging::init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    let result = match cli.command {
        Commands::Process(args) => commands::process::run(args, cli.verbose),

        Commands::Analyze {
            file,
            json,
            no_normalize,
        } => commands::analyze::run(file, json, no_normalize),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
