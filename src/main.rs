mod chunk;
mod cli;
mod commands;
mod logging;
mod mcp;
mod pdf;
mod selection;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Toc { path } => {
            commands::toc::run(&path)?;
        }
        Commands::Split(args) => {
            commands::split::run(args)?;
        }
    }

    Ok(())
}
