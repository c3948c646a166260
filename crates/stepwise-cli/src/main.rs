use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use stepwise_cli::logging::init_tracing;
use stepwise_cli::render::render_outcome;
use stepwise_cli::{Cli, Command, Scaffold, build_engine, execute};
use stepwise_config::ConfigLoader;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let Some(command_name) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let loaded = ConfigLoader::new(&cli.config).load();
    let level = loaded.as_ref().ok().and_then(|c| c.log.level.clone());
    init_tracing(cli.verbose, level.as_deref());

    let mut config = loaded.context("failed to load configuration")?;
    if cli.storage.is_some() {
        config.migrate.storage = cli.storage.clone();
    }

    let Some(command) = Command::parse(&command_name, cli.label.clone()) else {
        error!("unknown command: {command_name}");
        return Ok(ExitCode::FAILURE);
    };

    let engine = build_engine(&config.migrate).context("failed to register migrations")?;
    let scaffold = Scaffold::new(&config.migrate.migrations_dir);

    match execute(&engine, command.clone(), &scaffold).await {
        Ok(outcome) => {
            println!("{}", render_outcome(&outcome, cli.json)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("migrate {} failed: {e}", command.name());
            Ok(ExitCode::FAILURE)
        }
    }
}
