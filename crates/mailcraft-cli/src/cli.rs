//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mailcraft - Turn emailed PDF invoices into structured orders
#[derive(Parser)]
#[command(name = "mailcraft")]
#[command(about = "Invoice analysis server and tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (defaults to $PORT, then 3001)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Analyze a local PDF invoice
    ///
    /// Uses the backend selected by ANALYZER_BACKEND (azure or mock).
    Analyze {
        /// PDF file to analyze
        file: PathBuf,

        /// Print the extracted order details as JSON
        #[arg(long)]
        json: bool,
    },

    /// Filter a JSON document by a search term
    Filter {
        /// JSON file to read ("-" for stdin)
        file: String,

        /// Case-insensitive search term
        term: String,

        /// List matching paths instead of pruning the document
        #[arg(long)]
        search: bool,
    },
}
