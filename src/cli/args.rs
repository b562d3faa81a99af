//! CLI argument definitions using clap
//!
//! Commands:
//! - stockroom serve [--host <host>] [--port <port>] [--static-dir <dir>] [--cors-origin <origin>...]
//! - stockroom check-config
//!
//! Global: --log-level <debug|info|warn|error> (default info)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::Severity;

/// Stockroom - inventory and login backend over a document store
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lowest log severity written (debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: Severity,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Directory holding index.html and dashboard.html
        #[arg(long, default_value = ".")]
        static_dir: PathBuf,

        /// Allowed CORS origin (repeatable; none means any origin)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Parse the store configuration from the environment and report it
    CheckConfig,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
