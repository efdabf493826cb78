//! IPAC Console
//!
//! Command-line front end for the IPAC inventory:
//! - Dashboard: headline counts, subnet utilisation, service mix
//! - Hosts: filter, sort, paginate, bulk ping and tagging
//! - Subnets: membership, host moves between subnets, topology layouts
//! - Reports: CSV/XLSX export with a local summary when the backend fails
//!
//! Reads fall back to a bundled dataset when the backend is unreachable, so
//! every page renders offline.

mod cli;
mod commands;
mod config;
mod context;
mod error;
mod pages;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::Config;
use context::AppContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(&url)?;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    info!("Configuration:");
    info!("  API URL: {}", config.api_url);
    info!("  State dir: {}", config.state_dir.display());

    let mut ctx = AppContext::new(config).context("Failed to initialise console")?;
    if let Err(e) = commands::run(cli.command, &mut ctx).await {
        anyhow::bail!(e.user_message());
    }
    Ok(())
}
