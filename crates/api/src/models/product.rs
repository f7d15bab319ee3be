//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pitchside_core::{Money, ProductId, ProductStatus};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub original_price: Option<Money>,
    /// Units on hand. Never negative; mutated only through the conditional
    /// reserve/restore operations and admin edits.
    pub stock: i32,
    pub status: ProductStatus,
    /// Primary image path.
    pub image: String,
    /// Additional image paths.
    pub images: Vec<String>,
    /// Category name (not an id reference).
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether this product can currently be ordered.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        matches!(self.status, ProductStatus::Active)
    }
}

/// Fields for inserting a new product (used by the seeding CLI).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub stock: i32,
    pub status: ProductStatus,
    pub image: String,
    pub images: Vec<String>,
    pub category: String,
}
