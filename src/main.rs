mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            // Hint for classified API failures
            if let Some(api) = err.chain().find_map(|e| e.downcast_ref::<prismakit::Error>()) {
                eprintln!("  {}", api.category().advice());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match &cli.command {
        Command::Resources => commands::resources::run(&ctx),
        Command::Query(args) => commands::query::run(&ctx, &cli.connection, args),
        Command::Apply(args) => commands::apply::run(&ctx, &cli.connection, args),
        Command::Config(cmd) => commands::config::run(&ctx, &cli.connection, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "prismactl", &mut io::stdout());
            Ok(())
        }
    }
}
