use anyhow::Context;
use clap::Parser;
use tracing::info;
use uniqa::cli::handle_ask_command;
use uniqa::cli::handle_config_command;
use uniqa::cli::handle_ingest_command;
use uniqa::cli::handle_init_command;
use uniqa::cli::handle_serve_api;
use uniqa::cli::Cli;
use uniqa::cli::Commands;
use uniqa::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };

    // Initialize logging
    if cli.verbose {
        uniqa::logging::init_logging_with_level("debug")?;
    } else {
        uniqa::logging::init_logging_with_config(&config.logging)?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Ask { question } => {
            handle_ask_command(&config, &question).await?;
        }
        Commands::Init { force } => {
            handle_init_command(&config, force).await?;
        }
        Commands::Ingest { path, concurrency } => {
            handle_ingest_command(&config, &path, concurrency).await?;
        }
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
