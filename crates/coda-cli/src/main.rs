//! Coda CLI - resolve Maven-layout artifacts from the command line.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod output;

use clap::Parser;
use commands::{Cli, Commands};
use std::process::ExitCode;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    output::init(cli.no_ansi.then_some(false), cli.quiet);

    let result = run_command(&cli);
    tracing::debug!(elapsed = %output::format_duration(start.elapsed()), "done");

    match result {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Parse(args) => commands::parse::run(args)?,
        Commands::Repositories(args) => commands::repositories::run(cli, args)?,
        Commands::Resolve(args) => commands::resolve::run(cli, args)?,
        Commands::Scopes(args) => commands::scopes::run(cli, args)?,
    }
    Ok(ExitCode::SUCCESS)
}
