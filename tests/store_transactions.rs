//! Store Transaction Tests
//!
//! Concurrency properties of the optimistic read-modify-write path:
//! - concurrent quantity adjustments never lose an update
//! - concurrent adds of one id produce exactly one winner
//! - retries stop at the configured bound

use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use stockroom::inventory::{
    AddProductRequest, InventoryError, InventoryService, UpdateQuantityRequest,
};
use stockroom::observability::MetricsRegistry;
use stockroom::store::{
    run_transaction, DocumentStore, LocalStore, StoreError, TxError,
};

const PATIENT: u32 = 10_000;

fn product_fields(quantity: i64) -> serde_json::Map<String, Value> {
    match json!({"companyName": "Acme", "quantity": quantity, "imageUrl": "a.png"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn service(store: Arc<LocalStore>, metrics: Arc<MetricsRegistry>) -> InventoryService {
    InventoryService::with_max_attempts(store, metrics, PATIENT)
}

// =============================================================================
// Quantity Adjustment
// =============================================================================

/// Many threads adjusting one product serialize; the sum is exact.
#[test]
fn test_concurrent_adjustments_lose_nothing() {
    let store = Arc::new(LocalStore::in_memory());
    store.set("products", "P1", product_fields(100)).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let inventory = service(store.clone(), metrics.clone());
            thread::spawn(move || {
                let delta = if i % 2 == 0 { 3 } else { -1 };
                for _ in 0..25 {
                    inventory
                        .adjust_quantity(&UpdateQuantityRequest {
                            product_id: "P1".to_string(),
                            quantity_change: delta,
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // 4 threads * 25 * 3 - 4 threads * 25 * 1
    let doc = store.get("products", "P1").unwrap().unwrap();
    assert_eq!(doc.get("quantity"), Some(&json!(300)));
    assert_eq!(metrics.snapshot().quantity_updates, 200);
}

/// Two opposing adjustments that never cross zero land on initial + d1 + d2.
#[test]
fn test_two_adjustments_sum() {
    let store = Arc::new(LocalStore::in_memory());
    store.set("products", "P1", product_fields(10)).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());

    let a = service(store.clone(), metrics.clone());
    let b = service(store.clone(), metrics);
    let t1 = thread::spawn(move || {
        a.adjust_quantity(&UpdateQuantityRequest {
            product_id: "P1".to_string(),
            quantity_change: 7,
        })
    });
    let t2 = thread::spawn(move || {
        b.adjust_quantity(&UpdateQuantityRequest {
            product_id: "P1".to_string(),
            quantity_change: -4,
        })
    });
    t1.join().unwrap().unwrap();
    t2.join().unwrap().unwrap();

    let doc = store.get("products", "P1").unwrap().unwrap();
    assert_eq!(doc.get("quantity"), Some(&json!(13)));
}

/// Concurrent drains never push the stored quantity below zero.
#[test]
fn test_concurrent_drains_stay_non_negative() {
    let store = Arc::new(LocalStore::in_memory());
    store.set("products", "P1", product_fields(5)).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let inventory = service(store.clone(), metrics.clone());
            thread::spawn(move || {
                inventory.adjust_quantity(&UpdateQuantityRequest {
                    product_id: "P1".to_string(),
                    quantity_change: -3,
                })
            })
        })
        .collect();

    for handle in handles {
        let quantity = handle.join().unwrap().unwrap();
        assert!(quantity >= 0);
    }

    let doc = store.get("products", "P1").unwrap().unwrap();
    assert_eq!(doc.get("quantity"), Some(&json!(0)));
}

// =============================================================================
// Product Creation
// =============================================================================

/// Racing adds for one id: exactly one succeeds, the rest see a conflict.
#[test]
fn test_concurrent_duplicate_adds_have_one_winner() {
    let store = Arc::new(LocalStore::in_memory());
    let metrics = Arc::new(MetricsRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let inventory = service(store.clone(), metrics.clone());
            thread::spawn(move || {
                inventory.add_product(AddProductRequest {
                    company_name: format!("Company {}", i),
                    product_id: "P1".to_string(),
                    quantity: i,
                    image_url: "x.png".to_string(),
                })
            })
        })
        .collect();

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => winners += 1,
            Err(InventoryError::ProductExists(id)) => {
                assert_eq!(id, "P1");
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.count("products").unwrap(), 1);
    assert_eq!(metrics.snapshot().products_added, 1);
}

// =============================================================================
// Retry Bound
// =============================================================================

/// A body that always loses its race gives up after max_attempts.
#[test]
fn test_retries_are_bounded() {
    let store = LocalStore::in_memory();
    store.set("products", "P1", product_fields(1)).unwrap();

    let result: Result<_, TxError<()>> = run_transaction(&store, 3, |tx| {
        let current = tx.get("products", "P1").map_err(TxError::Store)?;
        assert!(current.is_some());
        // Interleaving writer bumps the version after every read.
        store
            .set("products", "P1", product_fields(1))
            .map_err(TxError::Store)?;
        tx.set("products", "P1", product_fields(2));
        Ok(())
    });

    match result {
        Err(TxError::Store(StoreError::TransactionAborted { attempts })) => {
            assert_eq!(attempts, 3)
        }
        other => panic!("expected abort, got {:?}", other.map(|o| o.retries)),
    }
}
