//! Inventory HTTP Routes
//!
//! Login and product endpoints. Every handler checks that the store is
//! configured, validates its payload, makes one service call, and maps the
//! result to JSON.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::AppState;
use crate::inventory::{
    AddProductRequest, InventoryError, InventoryResult, LoginRequest, Operation, Product,
    UpdateQuantityRequest,
};
use crate::observability::{Event, Logger, Severity};
use crate::store::StoreError;

/// Inventory routes with shared state
pub fn inventory_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/products", get(list_products_handler))
        .route("/product/:product_id", get(get_product_handler))
        .route("/add_product", post(add_product_handler))
        .route("/update_quantity", post(update_quantity_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

/// Body of every success acknowledgement and every error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(StatusResponse::failure(self.to_string()))).into_response()
    }
}

/// Bodies that are not JSON are treated like an empty payload, so they fail
/// validation instead of being rejected by the extractor.
fn parse_payload(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// Client errors are logged at warn level, server errors at error level
fn log_severity(err: &InventoryError) -> Severity {
    if err.is_client_error() {
        Severity::Warn
    } else {
        Severity::Error
    }
}

/// Log and count a failed request before it becomes a response
fn observe<T>(state: &AppState, result: InventoryResult<T>) -> InventoryResult<T> {
    let Err(err) = &result else {
        return result;
    };

    match err {
        InventoryError::Validation { issues, .. } => {
            state.metrics.increment_requests_rejected();
            let detail = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Logger::log(
                log_severity(err),
                Event::RequestRejected,
                &[("issues", detail.as_str())],
            );
        }
        InventoryError::Store { operation, source } => {
            state.metrics.increment_store_errors();
            let detail = source.to_string();
            Logger::log(
                log_severity(err),
                Event::StoreFailure,
                &[("error", detail.as_str()), ("operation", operation.as_str())],
            );
        }
        _ => {}
    }
    result
}

/// Run a store-backed request off the async workers.
///
/// Store calls take locks and, for the file backend, fsync on every commit.
async fn run_blocking<T, F>(
    state: Arc<AppState>,
    operation: Operation,
    request: F,
) -> InventoryResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> InventoryResult<T> + Send + 'static,
{
    let task_state = state.clone();
    let result = tokio::task::spawn_blocking(move || request(&task_state))
        .await
        .unwrap_or_else(|e| {
            Err(InventoryError::store(
                operation,
                StoreError::Unavailable(format!("store task failed: {}", e)),
            ))
        });
    observe(&state, result)
}

// ==================
// Handlers
// ==================

/// Login handler
async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StatusResponse>, InventoryError> {
    run_blocking(state, Operation::Login, move |state| login(state, &body)).await
}

fn login(state: &AppState, body: &[u8]) -> InventoryResult<Json<StatusResponse>> {
    let inventory = state.inventory()?;
    let request = LoginRequest::from_payload(&parse_payload(body))?;
    inventory.authenticate(&request)?;
    Ok(Json(StatusResponse::ok("Logged in successfully!")))
}

/// List all products
async fn list_products_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, InventoryError> {
    run_blocking(state, Operation::ListProducts, |state| {
        state.inventory()?.list_products().map(Json)
    })
    .await
}

/// Fetch one product by id
async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, InventoryError> {
    run_blocking(state, Operation::GetProduct, move |state| {
        state.inventory()?.get_product(&product_id).map(Json)
    })
    .await
}

/// Create a product
async fn add_product_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StatusResponse>, InventoryError> {
    run_blocking(state, Operation::AddProduct, move |state| {
        add_product(state, &body)
    })
    .await
}

fn add_product(state: &AppState, body: &[u8]) -> InventoryResult<Json<StatusResponse>> {
    let inventory = state.inventory()?;
    let request = AddProductRequest::from_payload(&parse_payload(body))?;
    inventory.add_product(request)?;
    Ok(Json(StatusResponse::ok("Product added successfully!")))
}

/// Add or subtract stock
async fn update_quantity_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StatusResponse>, InventoryError> {
    run_blocking(state, Operation::UpdateQuantity, move |state| {
        update_quantity(state, &body)
    })
    .await
}

fn update_quantity(state: &AppState, body: &[u8]) -> InventoryResult<Json<StatusResponse>> {
    let inventory = state.inventory()?;
    let request = UpdateQuantityRequest::from_payload(&parse_payload(body))?;
    inventory.adjust_quantity(&request)?;
    Ok(Json(StatusResponse::ok("Quantity updated successfully!")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ValidationIssue;

    #[test]
    fn test_parse_payload_tolerates_garbage() {
        assert_eq!(parse_payload(b"{not json"), Value::Null);
        assert_eq!(parse_payload(b""), Value::Null);
        assert_eq!(parse_payload(br#"{"a":1}"#)["a"], 1);
    }

    #[test]
    fn test_error_response_status() {
        let response = InventoryError::ProductExists("P1".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = InventoryError::Validation {
            message: "bad",
            issues: vec![ValidationIssue::Missing("productId")],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_observe_counts_rejections() {
        let state = AppState::without_store();
        let result: InventoryResult<()> = Err(InventoryError::Validation {
            message: "bad",
            issues: vec![ValidationIssue::Missing("username")],
        });
        assert!(observe(&state, result).is_err());
        assert_eq!(state.metrics.snapshot().requests_rejected, 1);
    }

    #[test]
    fn test_log_severity_follows_error_class() {
        assert_eq!(
            log_severity(&InventoryError::ProductNotFound("P1".into())),
            Severity::Warn
        );
        assert_eq!(
            log_severity(&InventoryError::InvalidCredentials),
            Severity::Warn
        );
        assert_eq!(
            log_severity(&InventoryError::store(
                Operation::AddProduct,
                StoreError::Unavailable("down".into())
            )),
            Severity::Error
        );
        assert_eq!(
            log_severity(&InventoryError::StoreNotConfigured),
            Severity::Error
        );
    }

    #[test]
    fn test_observe_counts_store_failures() {
        let state = AppState::without_store();
        let result: InventoryResult<()> = Err(InventoryError::store(
            Operation::ListProducts,
            StoreError::Unavailable("down".into()),
        ));
        assert!(observe(&state, result).is_err());
        assert_eq!(state.metrics.snapshot().store_errors, 1);
    }

    #[tokio::test]
    async fn test_run_blocking_returns_request_result() {
        let state = Arc::new(AppState::without_store());
        let result = run_blocking(state, Operation::ListProducts, |_| Ok(7)).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_blocking_turns_panics_into_store_errors() {
        let state = Arc::new(AppState::without_store());
        let result: InventoryResult<()> =
            run_blocking(state.clone(), Operation::AddProduct, |_| panic!("worker died")).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Store {
                operation: Operation::AddProduct,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Internal server error while adding the product.");
        assert_eq!(state.metrics.snapshot().store_errors, 1);
    }
}
