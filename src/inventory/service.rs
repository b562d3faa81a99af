//! # Inventory Service
//!
//! Composes request validation results with document-store calls. Each
//! operation issues one store read or one store transaction.

use std::sync::Arc;

use super::errors::{InventoryError, InventoryResult, Operation};
use super::product::{clamp_quantity, quantity_fields, quantity_of, Product, PRODUCTS_COLLECTION};
use super::requests::{AddProductRequest, LoginRequest, UpdateQuantityRequest};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::store::{
    run_transaction, DocumentStore, FieldFilter, Seed, StoreError, StoreResult, TxError,
    DEFAULT_MAX_ATTEMPTS,
};

/// Collection holding user documents
pub const USERS_COLLECTION: &str = "users";

/// Inventory operations over an injected document store
pub struct InventoryService {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<MetricsRegistry>,
    max_transaction_attempts: u32,
}

impl InventoryService {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self::with_max_attempts(store, metrics, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(
        store: Arc<dyn DocumentStore>,
        metrics: Arc<MetricsRegistry>,
        max_transaction_attempts: u32,
    ) -> Self {
        Self {
            store,
            metrics,
            max_transaction_attempts,
        }
    }

    /// Check credentials against the `users` collection.
    ///
    /// Plaintext, case-sensitive equality on both fields. Succeeds if at
    /// least one user document matches.
    pub fn authenticate(&self, request: &LoginRequest) -> InventoryResult<()> {
        let filters = [
            FieldFilter::eq("username", request.username.as_str()),
            FieldFilter::eq("password", request.password.as_str()),
        ];
        let matches = self
            .store
            .find(USERS_COLLECTION, &filters)
            .map_err(|e| InventoryError::store(Operation::Login, e))?;

        if matches.is_empty() {
            self.metrics.increment_logins_rejected();
            Logger::warn(Event::LoginRejected, &[("username", request.username.as_str())]);
            return Err(InventoryError::InvalidCredentials);
        }

        self.metrics.increment_logins_succeeded();
        Logger::info(Event::LoginSucceeded, &[("username", request.username.as_str())]);
        Ok(())
    }

    /// All products, in store order
    pub fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let snapshots = self
            .store
            .list(PRODUCTS_COLLECTION)
            .map_err(|e| InventoryError::store(Operation::ListProducts, e))?;

        snapshots
            .iter()
            .map(Product::from_snapshot)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InventoryError::store(Operation::ListProducts, e))
    }

    /// One product by identity
    pub fn get_product(&self, product_id: &str) -> InventoryResult<Product> {
        let snapshot = self
            .store
            .get(PRODUCTS_COLLECTION, product_id)
            .map_err(|e| InventoryError::store(Operation::GetProduct, e))?
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.to_string()))?;

        Product::from_snapshot(&snapshot).map_err(|e| InventoryError::store(Operation::GetProduct, e))
    }

    /// Create a product; its identity must be unused.
    ///
    /// The existence check and the write share one transaction, so of two
    /// concurrent adds for the same id exactly one succeeds.
    pub fn add_product(&self, request: AddProductRequest) -> InventoryResult<Product> {
        let product = Product {
            product_id: request.product_id,
            company_name: request.company_name,
            quantity: request.quantity,
            image_url: request.image_url,
        };

        let outcome = run_transaction(self.store.as_ref(), self.max_transaction_attempts, |tx| {
            if tx.get(PRODUCTS_COLLECTION, &product.product_id)?.is_some() {
                return Err(TxError::Abort(InventoryError::ProductExists(
                    product.product_id.clone(),
                )));
            }
            tx.set(PRODUCTS_COLLECTION, &product.product_id, product.to_fields());
            Ok(())
        });

        match outcome {
            Ok(outcome) => {
                self.metrics.add_transaction_retries(u64::from(outcome.retries));
                self.metrics.increment_products_added();
                Logger::info(Event::ProductAdded, &[("product_id", product.product_id.as_str())]);
                Ok(product)
            }
            Err(TxError::Abort(err)) => {
                self.metrics.increment_product_conflicts();
                Logger::warn(Event::ProductConflict, &[("product_id", product.product_id.as_str())]);
                Err(err)
            }
            Err(TxError::Store(err)) => Err(InventoryError::store(Operation::AddProduct, err)),
        }
    }

    /// Atomically add `quantity_change` to a product's quantity, clamping
    /// the result at zero. Returns the committed quantity.
    pub fn adjust_quantity(&self, request: &UpdateQuantityRequest) -> InventoryResult<i64> {
        let product_id = request.product_id.as_str();
        let delta = request.quantity_change;

        let outcome = run_transaction(self.store.as_ref(), self.max_transaction_attempts, |tx| {
            let snapshot = tx
                .get(PRODUCTS_COLLECTION, product_id)?
                .ok_or_else(|| {
                    TxError::Abort(InventoryError::ProductNotFound(product_id.to_string()))
                })?;

            let next = clamp_quantity(quantity_of(&snapshot)?, delta);
            tx.update(PRODUCTS_COLLECTION, product_id, quantity_fields(next));
            Ok(next)
        })
        .map_err(|err| match err {
            TxError::Abort(err) => err,
            TxError::Store(err) => InventoryError::store(Operation::UpdateQuantity, err),
        })?;

        self.metrics.add_transaction_retries(u64::from(outcome.retries));
        self.metrics.increment_quantity_updates();

        let delta_str = delta.to_string();
        let quantity_str = outcome.value.to_string();
        Logger::info(
            Event::QuantityAdjusted,
            &[
                ("delta", delta_str.as_str()),
                ("product_id", product_id),
                ("quantity", quantity_str.as_str()),
            ],
        );

        Ok(outcome.value)
    }
}

/// Reject seed documents the service could not read back.
///
/// Products need every field with its stored type and a non-negative
/// quantity; users need string `username` and `password`.
pub fn check_seed(seed: &Seed) -> StoreResult<()> {
    if let Some(products) = seed.get(PRODUCTS_COLLECTION) {
        for (id, fields) in products {
            let product = Product::from_fields(id, fields)?;
            if product.quantity < 0 {
                return Err(StoreError::malformed(
                    PRODUCTS_COLLECTION,
                    id,
                    "quantity is negative",
                ));
            }
        }
    }

    if let Some(users) = seed.get(USERS_COLLECTION) {
        for (id, fields) in users {
            for field in ["username", "password"] {
                if !fields.get(field).is_some_and(|v| v.is_string()) {
                    return Err(StoreError::malformed(
                        USERS_COLLECTION,
                        id,
                        format!("{} is not a string", field),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fields, LocalStore, StoreError};
    use serde_json::json;

    fn service_with(store: LocalStore) -> (InventoryService, Arc<LocalStore>) {
        let store = Arc::new(store);
        let service = InventoryService::new(store.clone(), Arc::new(MetricsRegistry::new()));
        (service, store)
    }

    fn add(service: &InventoryService, id: &str, quantity: i64) -> InventoryResult<Product> {
        service.add_product(AddProductRequest {
            company_name: "Acme".into(),
            product_id: id.into(),
            quantity,
            image_url: "http://x/y.png".into(),
        })
    }

    fn adjust(service: &InventoryService, id: &str, delta: i64) -> InventoryResult<i64> {
        service.adjust_quantity(&UpdateQuantityRequest {
            product_id: id.into(),
            quantity_change: delta,
        })
    }

    #[test]
    fn test_authenticate_exact_match_only() {
        let store = LocalStore::in_memory();
        let mut user = Fields::new();
        user.insert("username".into(), json!("admin"));
        user.insert("password".into(), json!("Secret"));
        store.set(USERS_COLLECTION, "u1", user).unwrap();
        let (service, _) = service_with(store);

        let ok = LoginRequest {
            username: "admin".into(),
            password: "Secret".into(),
        };
        assert!(service.authenticate(&ok).is_ok());

        let wrong_case = LoginRequest {
            username: "admin".into(),
            password: "secret".into(),
        };
        assert!(matches!(
            service.authenticate(&wrong_case),
            Err(InventoryError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_add_then_get_zero_quantity() {
        let (service, _) = service_with(LocalStore::in_memory());
        add(&service, "P1", 0).unwrap();

        let product = service.get_product("P1").unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.company_name, "Acme");
    }

    #[test]
    fn test_duplicate_add_keeps_first() {
        let (service, _) = service_with(LocalStore::in_memory());
        add(&service, "P1", 4).unwrap();

        let err = service
            .add_product(AddProductRequest {
                company_name: "Other".into(),
                product_id: "P1".into(),
                quantity: 99,
                image_url: "other".into(),
            })
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        let product = service.get_product("P1").unwrap();
        assert_eq!(product.company_name, "Acme");
        assert_eq!(product.quantity, 4);
    }

    #[test]
    fn test_get_unknown_product_is_not_found() {
        let (service, _) = service_with(LocalStore::in_memory());
        assert!(matches!(
            service.get_product("never"),
            Err(InventoryError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        let (service, _) = service_with(LocalStore::in_memory());
        add(&service, "P1", 5).unwrap();

        assert_eq!(adjust(&service, "P1", -10).unwrap(), 0);
        assert_eq!(service.get_product("P1").unwrap().quantity, 0);
        assert_eq!(adjust(&service, "P1", 7).unwrap(), 7);
    }

    #[test]
    fn test_adjust_unknown_product_is_not_found() {
        let (service, store) = service_with(LocalStore::in_memory());
        assert!(matches!(
            adjust(&service, "ghost", 1),
            Err(InventoryError::ProductNotFound(_))
        ));
        assert_eq!(store.count(PRODUCTS_COLLECTION).unwrap(), 0);
    }

    #[test]
    fn test_adjust_malformed_quantity_is_store_error() {
        let store = LocalStore::in_memory();
        let mut body = Fields::new();
        body.insert("quantity".into(), json!("five"));
        store.set(PRODUCTS_COLLECTION, "P1", body).unwrap();
        let (service, _) = service_with(store);

        let err = adjust(&service, "P1", 1).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Store {
                operation: Operation::UpdateQuantity,
                source: StoreError::MalformedDocument { .. }
            }
        ));
        assert_eq!(err.status_code(), 500);
    }

    fn seed(blob: serde_json::Value) -> Seed {
        serde_json::from_value(blob).unwrap()
    }

    #[test]
    fn test_check_seed_accepts_readable_documents() {
        let seed = seed(json!({
            "users": {"u1": {"username": "admin", "password": "secret"}},
            "products": {"P1": {"companyName": "Acme", "quantity": 0, "imageUrl": ""}},
            "audit": {"a1": {"anything": true}}
        }));
        assert!(check_seed(&seed).is_ok());
    }

    #[test]
    fn test_check_seed_rejects_float_quantity() {
        let seed = seed(json!({
            "products": {"P1": {"companyName": "Acme", "quantity": 5.0, "imageUrl": "x"}}
        }));
        assert!(matches!(
            check_seed(&seed),
            Err(StoreError::MalformedDocument { id, .. }) if id == "P1"
        ));
    }

    #[test]
    fn test_check_seed_rejects_missing_image_and_negative_quantity() {
        let missing = seed(json!({
            "products": {"P1": {"companyName": "Acme", "quantity": 1}}
        }));
        assert!(check_seed(&missing).is_err());

        let negative = seed(json!({
            "products": {"P1": {"companyName": "Acme", "quantity": -1, "imageUrl": "x"}}
        }));
        assert!(check_seed(&negative).is_err());
    }

    #[test]
    fn test_check_seed_rejects_user_without_password() {
        let seed = seed(json!({"users": {"u1": {"username": "admin"}}}));
        assert!(matches!(
            check_seed(&seed),
            Err(StoreError::MalformedDocument { collection, .. }) if collection == USERS_COLLECTION
        ));
    }

    #[test]
    fn test_list_attaches_ids() {
        let (service, _) = service_with(LocalStore::in_memory());
        add(&service, "B", 1).unwrap();
        add(&service, "A", 2).unwrap();

        let products = service.list_products().unwrap();
        let ids: Vec<_> = products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
