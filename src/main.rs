//! Notebook ML - Main Entry Point

use clap::Parser;
use notebook_ml::cli::{cmd_chapter, cmd_describe, cmd_info, cmd_list, cmd_rules, cmd_run, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notebook_ml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, data } => {
            cmd_run(&config, data.as_deref())?;
        }
        Commands::Chapter { name, data, dump_config } => {
            cmd_chapter(&name, &data, dump_config)?;
        }
        Commands::List => {
            cmd_list()?;
        }
        Commands::Info { data, delimiter } => {
            cmd_info(&data, delimiter)?;
        }
        Commands::Describe { data, column } => {
            cmd_describe(&data, &column)?;
        }
        Commands::Rules { baskets, lhs, rhs, delimiter } => {
            cmd_rules(&baskets, &lhs, &rhs, delimiter)?;
        }
    }

    Ok(())
}
