mod cli;
mod commands;
mod config;
mod desired;
mod engine;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
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
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "caixa", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::load(cli.config.as_deref(), &cli.paths.overrides())?;
    log::debug!("Settings: {settings:?}");

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, &settings, args.target.as_deref())?,
        Command::Apply(args) => commands::apply::run(&ctx, &settings, &args)?,
        Command::Drift => return commands::drift::run(&ctx, &settings),
        Command::Status => commands::status::run(&ctx, &settings)?,
        Command::Completions { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}
