//! Lexo - Main Entry Point
//!
//! Loads configuration, initializes logging and runs one command.

use clap::Parser;
use lexo::{App, Cli};
use lexo_infrastructure::{ClientConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ClientConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_filter)?;

    let app = App::connect(&config, cli.ephemeral).await?;
    let output = app.run(cli.command).await?;
    println!("{output}");

    Ok(())
}
