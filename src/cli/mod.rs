//! CLI module for stockroom
//!
//! Provides command-line interface for:
//! - serve: open the store and run the HTTP server
//! - check-config: validate the store configuration and exit

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{build_state, check_config, config_report, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
