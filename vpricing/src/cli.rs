//! Command-line interface definition and parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the vendor pricing service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do; defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The service's operating modes.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (and the cycle scheduler, when configured)
    Serve,

    /// Run one ingestion cycle and exit
    Ingest {
        /// Cycle tag to ingest under; defaults to the current UTC year-month
        #[arg(long)]
        cycle: Option<String>,
    },

    /// Create or migrate the database schema and exit
    CreateTables,

    /// List the newest messages in the vendor feed mailbox and exit
    Mailbox {
        /// How many messages to list
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn import() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
