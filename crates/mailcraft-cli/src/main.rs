//! Mailcraft CLI - Invoice analysis for emailed PDF orders
//!
//! Usage:
//!   mailcraft serve --port 3001           Start web server
//!   mailcraft analyze invoice.pdf         Analyze a PDF invoice
//!   mailcraft filter catalog.json coral   Filter a JSON document

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(&host, port).await,
        Commands::Analyze { file, json } => commands::cmd_analyze(&file, json).await,
        Commands::Filter { file, term, search } => commands::cmd_filter(&file, &term, search),
    }
}
