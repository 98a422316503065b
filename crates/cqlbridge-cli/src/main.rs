mod cli;
mod client;
mod commands;
mod output;
mod patient;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use client::FhirClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    let client = FhirClient::new(&cli.server, &cli.username, &cli.password)?;

    match &cli.command {
        Commands::CreatePatient(args) => {
            commands::patient::create(&client, args, format).await?;
        }
        Commands::ReadPatient(args) => {
            commands::patient::read(&client, &args.id, format).await?;
        }
        Commands::Demo => {
            commands::patient::demo(&client).await?;
        }
    }

    Ok(())
}
