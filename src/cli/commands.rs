//! CLI command implementations

use std::io::{self, Write};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http_server::{AppState, HttpServer, HttpServerConfig};
use crate::inventory::check_seed;
use crate::observability::{Event, Logger};
use crate::store::{pending_seed, LocalStore, StoreConfig, StoreResult, STORE_CONFIG_ENV};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    Logger::set_threshold(cli.log_level);
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            host,
            port,
            static_dir,
            cors_origins,
        } => serve(HttpServerConfig {
            host,
            port,
            cors_origins,
            static_dir,
        }),
        Command::CheckConfig => check_config(),
    }
}

/// Build application state from a store configuration lookup.
///
/// A missing or unusable configuration is logged and yields state without a
/// store: the server still starts and serves the static pages.
pub fn build_state(config: StoreResult<Option<StoreConfig>>) -> AppState {
    let config = match config {
        Ok(Some(config)) => config,
        Ok(None) => {
            Logger::warn(Event::StoreUnconfigured, &[("env", STORE_CONFIG_ENV)]);
            return AppState::without_store();
        }
        Err(e) => {
            let detail = e.to_string();
            Logger::error(Event::StoreInitFailed, &[("error", detail.as_str())]);
            return AppState::without_store();
        }
    };

    match open_checked(&config) {
        Ok(store) => {
            Logger::info(
                Event::StoreInitialized,
                &[("backend", config.backend.name())],
            );
            AppState::with_store(Arc::new(store), config.max_transaction_attempts)
        }
        Err(e) => {
            let detail = e.to_string();
            Logger::error(Event::StoreInitFailed, &[("error", detail.as_str())]);
            AppState::without_store()
        }
    }
}

fn open_checked(config: &StoreConfig) -> StoreResult<LocalStore> {
    check_seed(&config.seed)?;
    config.open_store()
}

/// Start the HTTP server
///
/// 1. Read the store configuration from the environment
/// 2. Open the store (or continue without one)
/// 3. Serve on the configured address until the listener fails
pub fn serve(config: HttpServerConfig) -> CliResult<()> {
    let state = build_state(StoreConfig::from_env());
    let server = HttpServer::new(config, state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate the store configuration without starting the server.
///
/// Read-only: the backend is opened but the seed is not applied, so no
/// snapshot file is created or rewritten.
pub fn check_config() -> CliResult<()> {
    let config = StoreConfig::from_env()?.ok_or_else(|| {
        CliError::config_error(format!("{} is not set", STORE_CONFIG_ENV))
    })?;

    write_json(&config_report(&config)?)
}

/// Report on a parsed configuration: backend, stored documents per seeded
/// collection, and how many seed documents the next start would insert.
pub fn config_report(config: &StoreConfig) -> CliResult<Value> {
    check_seed(&config.seed)?;
    let store = config.open_backend()?;

    let mut collections = serde_json::Map::new();
    for name in config.seed.keys() {
        collections.insert(name.clone(), json!(store.count(name)?));
    }

    Ok(json!({
        "status": "ok",
        "backend": config.backend.name(),
        "max_transaction_attempts": config.max_transaction_attempts,
        "stored_documents": collections,
        "pending_seed_documents": pending_seed(&store, &config.seed)?,
    }))
}

fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_missing_config_builds_storeless_state() {
        let state = build_state(Ok(None));
        assert!(!state.store_ready());
    }

    #[test]
    fn test_invalid_config_builds_storeless_state() {
        let state = build_state(Err(StoreError::InvalidConfig("bad".into())));
        assert!(!state.store_ready());
    }

    #[test]
    fn test_memory_config_builds_ready_state() {
        let config = StoreConfig::from_json(r#"{"backend": "memory"}"#).unwrap();
        let state = build_state(Ok(Some(config)));
        assert!(state.store_ready());
    }

    #[test]
    fn test_unreadable_snapshot_builds_storeless_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not a snapshot").unwrap();

        let config = StoreConfig::from_json(
            &json!({"backend": "file", "path": path}).to_string(),
        )
        .unwrap();
        let state = build_state(Ok(Some(config)));
        assert!(!state.store_ready());
    }

    #[test]
    fn test_unreadable_seed_builds_storeless_state() {
        let config = StoreConfig::from_json(
            &json!({
                "backend": "memory",
                "seed": {"products": {"P1": {"companyName": "Acme", "quantity": 5.0, "imageUrl": "x"}}}
            })
            .to_string(),
        )
        .unwrap();
        let state = build_state(Ok(Some(config)));
        assert!(!state.store_ready());
    }

    #[test]
    fn test_config_report_leaves_files_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let config = StoreConfig::from_json(
            &json!({
                "backend": "file",
                "path": path,
                "seed": {
                    "users": {"u1": {"username": "admin", "password": "secret"}},
                    "products": {"P1": {"companyName": "Acme", "quantity": 5, "imageUrl": "x"}}
                }
            })
            .to_string(),
        )
        .unwrap();

        let report = config_report(&config).unwrap();
        assert_eq!(report["backend"], "file");
        assert_eq!(report["pending_seed_documents"], 2);
        assert_eq!(report["stored_documents"]["products"], 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_config_report_rejects_unreadable_seed() {
        let config = StoreConfig::from_json(
            &json!({
                "backend": "memory",
                "seed": {"users": {"u1": {"username": "admin"}}}
            })
            .to_string(),
        )
        .unwrap();
        let err = config_report(&config).unwrap_err();
        assert_eq!(err.code(), &crate::cli::CliErrorCode::ConfigError);
    }
}
