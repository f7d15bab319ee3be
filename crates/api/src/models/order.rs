//! Order domain types.
//!
//! An order owns its line items as frozen snapshots of the products at
//! checkout time: later product edits never retroactively change historical
//! orders. The shipping address is likewise a snapshot, not a reference into
//! the user's address book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pitchside_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod,
    PaymentStatus, ProductId, UserId};

/// A shipping destination, snapshotted onto the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// A frozen order line item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// The product this line was taken from. Informational only; the product
    /// may have been edited or deleted since.
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i32,
    pub image: String,
    pub size: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Human-facing order reference, e.g. `PS-000042`.
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_id: Option<PaymentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item about to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i32,
    pub image: String,
    pub size: Option<String>,
}

/// Fields for persisting a new order together with its payment record.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
}
