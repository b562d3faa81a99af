//! Shared application state
//!
//! Built once at startup and handed to every handler through axum state.
//! The inventory service is absent when no store was configured; handlers
//! then answer with [`InventoryError::StoreNotConfigured`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::inventory::{InventoryError, InventoryResult, InventoryService};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::store::DocumentStore;

/// State shared across handlers
pub struct AppState {
    inventory: Option<InventoryService>,
    pub metrics: Arc<MetricsRegistry>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// State backed by an initialized store
    pub fn with_store(store: Arc<dyn DocumentStore>, max_transaction_attempts: u32) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let inventory =
            InventoryService::with_max_attempts(store, metrics.clone(), max_transaction_attempts);
        Self {
            inventory: Some(inventory),
            metrics,
            started_at: Utc::now(),
        }
    }

    /// State for a process that has no store; only static pages work
    pub fn without_store() -> Self {
        Self {
            inventory: None,
            metrics: Arc::new(MetricsRegistry::new()),
            started_at: Utc::now(),
        }
    }

    pub fn store_ready(&self) -> bool {
        self.inventory.is_some()
    }

    /// The inventory service, or the configuration error every store-backed
    /// endpoint reports first
    pub fn inventory(&self) -> InventoryResult<&InventoryService> {
        self.inventory.as_ref().ok_or_else(|| {
            self.metrics.increment_store_errors();
            Logger::error(Event::StoreUnavailable, &[]);
            InventoryError::StoreNotConfigured
        })
    }
}
