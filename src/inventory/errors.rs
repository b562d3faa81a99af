//! # Inventory Errors
//!
//! The closed set of ways an inventory request can fail. Each kind maps to
//! exactly one HTTP status code.

use thiserror::Error;

use super::validation::ValidationIssue;
use crate::store::StoreError;

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// The operation a store failure happened in, used for the public message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    ListProducts,
    GetProduct,
    AddProduct,
    UpdateQuantity,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::ListProducts => "list_products",
            Operation::GetProduct => "get_product",
            Operation::AddProduct => "add_product",
            Operation::UpdateQuantity => "update_quantity",
        }
    }

    fn activity(&self) -> &'static str {
        match self {
            Operation::Login => "logging in",
            Operation::ListProducts => "fetching products",
            Operation::GetProduct => "fetching the product",
            Operation::AddProduct => "adding the product",
            Operation::UpdateQuantity => "updating the quantity",
        }
    }
}

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The store was never initialized (missing or unusable configuration)
    #[error("Database connection error. Please check the server settings.")]
    StoreNotConfigured,

    /// Required request fields are missing or malformed.
    ///
    /// The message describes the general problem; `issues` names the fields
    /// and is only logged.
    #[error("{message}")]
    Validation {
        message: &'static str,
        issues: Vec<ValidationIssue>,
    },

    /// No user matched the supplied username and password
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    /// The product identity does not exist
    #[error("Product not found.")]
    ProductNotFound(String),

    /// The product identity is already taken
    #[error("A product with this ID already exists!")]
    ProductExists(String),

    /// Unexpected store failure; details are logged, never returned
    #[error("Internal server error while {}.", .operation.activity())]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl InventoryError {
    pub fn store(operation: Operation, source: StoreError) -> Self {
        InventoryError::Store { operation, source }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            InventoryError::Validation { .. } => 400,
            InventoryError::InvalidCredentials => 401,
            InventoryError::ProductNotFound(_) => 404,
            InventoryError::ProductExists(_) => 409,
            InventoryError::StoreNotConfigured => 500,
            InventoryError::Store { .. } => 500,
        }
    }

    /// Client errors are logged at warn level, server errors at error level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
