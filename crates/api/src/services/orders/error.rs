//! Order workflow error types.

use thiserror::Error;

use pitchside_core::OrderStatus;

use crate::db::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout from an empty (or entirely unavailable) cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line item could not be covered by current stock.
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    /// A buy-now item referenced a product that doesn't exist.
    #[error("Product {0} not found")]
    UnknownProduct(String),

    /// Shipping-address or payment-method validation failed.
    #[error("{0}")]
    Validation(String),

    /// Order not found.
    #[error("Order not found")]
    NotFound,

    /// Requester is neither the owner nor an admin.
    #[error("Access denied")]
    Forbidden,

    /// Non-admin cancellation of an order that already progressed.
    #[error("Only pending orders can be cancelled")]
    NotCancellable,

    /// Status change rejected by the lifecycle transition table.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
