mod cli;
mod commands;
mod descriptor;
mod engine;
mod paths;
mod platform;
mod progress;
mod resource;
mod runner;
mod schema;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Settings file given on the command line or through the environment
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    match cli.command {
        Command::Install(args) => commands::converge::install(&ctx, &args),
        Command::Uninstall(args) => commands::converge::uninstall(&ctx, &args),
        Command::Diff(args) => commands::diff::run(&ctx, &args),
        Command::Render(args) => commands::render::run(&ctx, &args),
        Command::Check => commands::check::run(&ctx),
        Command::Doctor => commands::doctor::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "berks-deploy", &mut io::stdout());
            Ok(())
        }
    }
}
