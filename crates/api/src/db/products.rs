//! Product repository.
//!
//! Besides plain reads, this module owns the two stock mutations used by the
//! order workflow:
//!
//! - [`ProductRepository::reserve_stock`] - the atomic conditional decrement
//!   (`stock = stock - q` only when `stock >= q`). A zero-row update means
//!   another checkout won the race; there are no locks anywhere else.
//! - [`ProductRepository::restore_stock`] - the inverse increment used by
//!   cancellation and by reservation compensation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pitchside_core::{Money, ProductId, ProductStatus};

use super::RepositoryError;
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, price, original_price, stock, status, image, images, \
     category, created_at, updated_at";

/// Raw `products` row.
#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock: i32,
    pub status: String,
    pub image: String,
    pub images: Vec<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> Result<Product, RepositoryError> {
        let status: ProductStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product status in database: {e}"))
        })?;

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: Money::new(self.price),
            original_price: self.original_price.map(Money::new),
            stock: self.stock,
            status,
            image: self.image,
            images: self.images,
            category: self.category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Insert a new product (seeding / admin tooling).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, price, original_price, stock, status, image, images, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.price)
        .bind(new.original_price)
        .bind(new.stock)
        .bind(new.status.to_string())
        .bind(&new.image)
        .bind(&new.images)
        .bind(&new.category)
        .fetch_one(self.pool)
        .await?;

        row.into_product()
    }

    /// Atomically reserve `quantity` units of stock.
    ///
    /// The decrement only applies when the current stock covers the request,
    /// so concurrent checkouts serialize on this single statement and the
    /// stock counter can never go negative. Returns `false` when the
    /// condition did not hold (insufficient stock, possibly because a
    /// concurrent order got there first).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reserve_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Return `quantity` units of stock (cancellation, or compensation after
    /// a partially failed reservation).
    ///
    /// A missing product is not an error here: the product may have been
    /// deleted after the order was placed, and the restore is best-effort.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn restore_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
