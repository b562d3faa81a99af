//! Product model
//!
//! A product's identity is its document id in the `products` collection.
//! The stored body holds the remaining three fields; `productId` is attached
//! when a document is read back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{DocumentSnapshot, Fields, StoreError, StoreResult};

/// Collection holding product documents
pub const PRODUCTS_COLLECTION: &str = "products";

/// Product as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub company_name: String,
    pub quantity: i64,
    pub image_url: String,
}

impl Product {
    /// Build a product from a stored document, attaching its id
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> StoreResult<Self> {
        Self::from_fields(&snapshot.id, &snapshot.fields)
    }

    /// Build a product from a document body and its id
    pub fn from_fields(id: &str, fields: &Fields) -> StoreResult<Self> {
        Ok(Self {
            product_id: id.to_string(),
            company_name: text_field(id, fields, "companyName")?,
            quantity: quantity_field(id, fields)?,
            image_url: text_field(id, fields, "imageUrl")?,
        })
    }

    /// The stored document body (everything except the identity)
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            "companyName".to_string(),
            Value::String(self.company_name.clone()),
        );
        fields.insert("quantity".to_string(), Value::from(self.quantity));
        fields.insert("imageUrl".to_string(), Value::String(self.image_url.clone()));
        fields
    }
}

/// Read the integer `quantity` field of a product document
pub fn quantity_of(snapshot: &DocumentSnapshot) -> StoreResult<i64> {
    quantity_field(&snapshot.id, &snapshot.fields)
}

fn quantity_field(id: &str, fields: &Fields) -> StoreResult<i64> {
    fields
        .get("quantity")
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::malformed(PRODUCTS_COLLECTION, id, "quantity is not an integer"))
}

/// Fields body that sets only `quantity`
pub fn quantity_fields(quantity: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("quantity".to_string(), Value::from(quantity));
    fields
}

/// `current + delta`, clamped so the result is never negative
pub fn clamp_quantity(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

fn text_field(id: &str, fields: &Fields, field: &str) -> StoreResult<String> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            StoreError::malformed(PRODUCTS_COLLECTION, id, format!("{} is not a string", field))
        })
}
