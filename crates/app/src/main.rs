use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::Cli;
use commands::ReportOptions;
use config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr so the CSV can be piped from stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let range = cli.date_range(today).context("Invalid date range")?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    tracing::debug!("Using config {}", config_path.display());
    let config = AppConfig::load(&config_path)?;

    let options = ReportOptions {
        range,
        output: cli.output(),
        halt_on_missing: cli.halt_on_missing,
        check_crm: cli.check_crm,
    };
    commands::run_report(config, options).await?;
    Ok(())
}
