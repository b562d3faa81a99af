//! Request and store counters
//!
//! - Counters only, monotonic, reset on process start
//! - Lock-free: every counter is an `AtomicU64` with relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry shared by every handler
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    logins_succeeded: AtomicU64,
    logins_rejected: AtomicU64,
    products_added: AtomicU64,
    product_conflicts: AtomicU64,
    quantity_updates: AtomicU64,
    requests_rejected: AtomicU64,
    transaction_retries: AtomicU64,
    store_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_logins_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_logins_rejected(&self) {
        self.logins_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_products_added(&self) {
        self.products_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_product_conflicts(&self) {
        self.product_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_quantity_updates(&self) {
        self.quantity_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Validation failures (400)
    pub fn increment_requests_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Add the number of optimistic-commit retries a transaction needed
    pub fn add_transaction_retries(&self, retries: u64) {
        self.transaction_retries.fetch_add(retries, Ordering::Relaxed);
    }

    /// Store errors and missing-store responses (500)
    pub fn increment_store_errors(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_rejected: self.logins_rejected.load(Ordering::Relaxed),
            products_added: self.products_added.load(Ordering::Relaxed),
            product_conflicts: self.product_conflicts.load(Ordering::Relaxed),
            quantity_updates: self.quantity_updates.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            transaction_retries: self.transaction_retries.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub logins_succeeded: u64,
    pub logins_rejected: u64,
    pub products_added: u64,
    pub product_conflicts: u64,
    pub quantity_updates: u64,
    pub requests_rejected: u64,
    pub transaction_retries: u64,
    pub store_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zeroed() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.logins_succeeded, 0);
        assert_eq!(snapshot.quantity_updates, 0);
        assert_eq!(snapshot.store_errors, 0);
    }

    #[test]
    fn test_retries_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.add_transaction_retries(2);
        metrics.add_transaction_retries(0);
        metrics.add_transaction_retries(3);
        assert_eq!(metrics.snapshot().transaction_retries, 5);
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.increment_products_added();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().products_added, 8000);
    }

    #[test]
    fn test_snapshot_serializes_with_counter_names() {
        let metrics = MetricsRegistry::new();
        metrics.increment_logins_rejected();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["logins_rejected"], 1);
        assert_eq!(json["products_added"], 0);
    }
}
