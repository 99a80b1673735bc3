//! CLI module for CoreLink

use clap::{Parser, Subcommand};

/// CoreLink node gateway CLI
#[derive(Parser, Debug)]
#[command(name = "corelink")]
#[command(about = "GPU node monitoring and control gateway")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway server (default)
    Serve,
    /// Print the effective configuration and exit
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Config) => {
            let config = crate::server::load_config()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Commands::Serve) | None => crate::server::run().await,
    }
}
