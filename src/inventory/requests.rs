//! Typed request shapes
//!
//! Each endpoint's payload is checked against its field specs and only then
//! converted into a typed request. Handlers never see unvalidated JSON.

use serde_json::Value;

use super::errors::{InventoryError, InventoryResult};
use super::validation::{validate, FieldSpec};

fn checked(payload: &Value, specs: &[FieldSpec], message: &'static str) -> InventoryResult<()> {
    validate(payload, specs).map_err(|issues| InventoryError::Validation { message, issues })
}

// Only called after `checked` accepted the field.
fn text(payload: &Value, field: &str) -> String {
    payload
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn integer(payload: &Value, field: &str) -> i64 {
    payload.get(field).and_then(Value::as_i64).unwrap_or_default()
}

/// `POST /login`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub const FIELDS: &'static [FieldSpec] =
        &[FieldSpec::text("username"), FieldSpec::text("password")];

    pub fn from_payload(payload: &Value) -> InventoryResult<Self> {
        checked(payload, Self::FIELDS, "Username and password are required.")?;
        Ok(Self {
            username: text(payload, "username"),
            password: text(payload, "password"),
        })
    }
}

/// `POST /add_product`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProductRequest {
    pub company_name: String,
    pub product_id: String,
    pub quantity: i64,
    pub image_url: String,
}

impl AddProductRequest {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("companyName"),
        FieldSpec::text("productId"),
        FieldSpec::count("quantity"),
        FieldSpec::text("imageUrl"),
    ];

    pub fn from_payload(payload: &Value) -> InventoryResult<Self> {
        checked(payload, Self::FIELDS, "Please fill in all required fields.")?;
        Ok(Self {
            company_name: text(payload, "companyName"),
            product_id: text(payload, "productId"),
            quantity: integer(payload, "quantity"),
            image_url: text(payload, "imageUrl"),
        })
    }
}

/// `POST /update_quantity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub quantity_change: i64,
}

impl UpdateQuantityRequest {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("productId"),
        FieldSpec::integer("quantityChange"),
    ];

    pub fn from_payload(payload: &Value) -> InventoryResult<Self> {
        checked(payload, Self::FIELDS, "Invalid product or quantity data.")?;
        Ok(Self {
            product_id: text(payload, "productId"),
            quantity_change: integer(payload, "quantityChange"),
        })
    }
}
