use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wheff_cli::commands::{aliases, analyze, show_config};
use wheff_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Analyze(args)) => analyze::run(args, &config)?,
        Some(Commands::Aliases { report }) => aliases::run(report.unwrap_or(config.report)),
        Some(Commands::Config) => show_config::run(&config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
