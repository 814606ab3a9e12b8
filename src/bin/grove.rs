//! Grove CLI Binary
//!
//! Command-line interface for content-fingerprinted node containers.

use clap::Parser;
use grove::logging::init_logging;
use grove::tooling::cli::{load_config, Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.workspace, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    cli.apply_log_flags(&mut config);
    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = match CliContext::with_config(cli.workspace.clone(), &config, cli.containers.clone())
    {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
