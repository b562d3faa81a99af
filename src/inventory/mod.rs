//! # Inventory
//!
//! Login and product operations: request validation, typed request shapes,
//! the product model, and the service that talks to the document store.

pub mod errors;
pub mod product;
pub mod requests;
pub mod service;
pub mod validation;

pub use errors::{InventoryError, InventoryResult, Operation};
pub use product::{clamp_quantity, Product, PRODUCTS_COLLECTION};
pub use requests::{AddProductRequest, LoginRequest, UpdateQuantityRequest};
pub use service::{check_seed, InventoryService, USERS_COLLECTION};
pub use validation::{validate, FieldKind, FieldSpec, ValidationIssue};
