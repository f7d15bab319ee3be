//! Database operations for the Pitchside `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Accounts, login-attempt/lockout counters, pending OTPs
//! - `addresses` - Saved shipping addresses
//! - `cart_items` - Per-user cart entries
//! - `categories` / `products` - Catalog (products hold the stock counter)
//! - `orders` / `order_items` - Orders with frozen line-item snapshots
//! - `payments` - One payment record per order
//! - `notifications` - Admin- and user-facing notifications
//!
//! All repositories use sqlx's runtime query API (`query`/`query_as` with
//! `FromRow` row structs) rather than the compile-time macros, so the
//! workspace builds without a live database or prepared-query cache.
//! Status-like TEXT columns are parsed into their enums on read; a bad stored
//! value surfaces as [`RepositoryError::DataCorruption`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p pitchside-cli -- migrate
//! ```

pub mod categories;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
