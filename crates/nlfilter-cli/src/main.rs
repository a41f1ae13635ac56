//! nlfilter CLI
//!
//! Natural-language queries to Pinecone metadata filters.

use anyhow::Result;
use clap::Parser;
use nlfilter_core::{error::exit_codes, Config, NlFilterError};
use std::path::Path;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<NlFilterError>()
            .map(NlFilterError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Filter(args) => {
            commands::filter::run(args, &load_config(&config_path)?, cli.format).await
        }
        Commands::Search(args) => {
            commands::search::run(args, &load_config(&config_path)?, cli.format).await
        }
        Commands::Prompt(args) => {
            commands::prompt::run(args, &load_config(&config_path)?, cli.format).await
        }
        Commands::Schema => commands::schema::run(cli.format).await,
        Commands::Stats => commands::stats::run(&load_config(&config_path)?, cli.format).await,
        Commands::Config(args) => commands::config::run(args, &config_path, cli.format).await,
    }
}

/// Config file plus environment overrides
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_from(path)?.with_env_overrides();
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
