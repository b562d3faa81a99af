//! Store Configuration
//!
//! The whole store configuration arrives as one JSON blob in the
//! `STOCKROOM_STORE_CONFIG` environment variable:
//!
//! ```json
//! {
//!   "backend": "file",
//!   "path": "./data/stockroom.json",
//!   "max_transaction_attempts": 5,
//!   "seed": {
//!     "users": { "admin": { "username": "admin", "password": "admin" } },
//!     "products": { "P1": { "companyName": "Acme", "quantity": 5, "imageUrl": "" } }
//!   }
//! }
//! ```
//!
//! An unset or blank variable means "no store": store-backed endpoints answer
//! with a configuration error while static pages keep working.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::document::{CommitRequest, Fields, Precondition, WriteOp};
use super::errors::{StoreError, StoreResult};
use super::local::LocalStore;
use super::transaction::DEFAULT_MAX_ATTEMPTS;
use super::DocumentStore;
use crate::observability::{Event, Logger};

/// Environment variable carrying the store configuration blob
pub const STORE_CONFIG_ENV: &str = "STOCKROOM_STORE_CONFIG";

/// Where documents live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process memory only
    Memory,
    /// Memory, persisted to a snapshot file after every commit
    File { path: PathBuf },
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File { .. } => "file",
        }
    }
}

/// Documents to insert at startup: collection -> id -> fields
pub type Seed = BTreeMap<String, BTreeMap<String, Fields>>;

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub backend: StoreBackend,

    /// Documents inserted at startup unless a document with that id exists
    #[serde(default)]
    pub seed: Seed,

    /// Upper bound on optimistic transaction runs (default: 5)
    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,
}

fn default_max_transaction_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            seed: Seed::new(),
            max_transaction_attempts: default_max_transaction_attempts(),
        }
    }
}

impl StoreConfig {
    /// Parse and validate a configuration blob
    pub fn from_json(blob: &str) -> StoreResult<Self> {
        let config: StoreConfig =
            serde_json::from_str(blob).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        if config.max_transaction_attempts == 0 {
            return Err(StoreError::InvalidConfig(
                "max_transaction_attempts must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Read the configuration from [`STORE_CONFIG_ENV`].
    ///
    /// Returns `Ok(None)` when the variable is unset or blank.
    pub fn from_env() -> StoreResult<Option<Self>> {
        match env::var(STORE_CONFIG_ENV) {
            Ok(blob) if !blob.trim().is_empty() => Self::from_json(&blob).map(Some),
            Ok(_) | Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(StoreError::InvalidConfig(format!(
                "{} is not valid UTF-8",
                STORE_CONFIG_ENV
            ))),
        }
    }

    /// Open the configured backend without writing anything.
    ///
    /// A file backend whose snapshot does not exist yet opens empty and the
    /// file is only created by the first commit.
    pub fn open_backend(&self) -> StoreResult<LocalStore> {
        match &self.backend {
            StoreBackend::Memory => Ok(LocalStore::in_memory()),
            StoreBackend::File { path } => LocalStore::open(path.clone()),
        }
    }

    /// Open the configured backend and apply the seed
    pub fn open_store(&self) -> StoreResult<LocalStore> {
        let store = self.open_backend()?;

        let inserted = seed_store(&store, &self.seed)?;
        if inserted > 0 {
            let inserted_str = inserted.to_string();
            Logger::info(Event::StoreSeeded, &[("documents", inserted_str.as_str())]);
        }

        Ok(store)
    }
}

fn seed_request(store: &dyn DocumentStore, seed: &Seed) -> StoreResult<CommitRequest> {
    let mut request = CommitRequest::default();

    for (collection, documents) in seed {
        for (id, fields) in documents {
            if store.get(collection, id)?.is_some() {
                continue;
            }
            request.preconditions.push(Precondition {
                collection: collection.clone(),
                id: id.clone(),
                expected: None,
            });
            request.writes.push(WriteOp::Set {
                collection: collection.clone(),
                id: id.clone(),
                fields: fields.clone(),
            });
        }
    }

    Ok(request)
}

/// Number of seed documents whose ids are not taken yet
pub fn pending_seed(store: &dyn DocumentStore, seed: &Seed) -> StoreResult<usize> {
    Ok(seed_request(store, seed)?.writes.len())
}

/// Insert seed documents whose ids are not taken yet.
///
/// Existing documents are never overwritten, so a file-backed store keeps
/// its data across restarts with the same seed. Returns the number inserted.
pub fn seed_store(store: &dyn DocumentStore, seed: &Seed) -> StoreResult<usize> {
    let request = seed_request(store, seed)?;
    let inserted = request.writes.len();
    if inserted > 0 {
        store.commit(request)?;
    }
    Ok(inserted)
}
