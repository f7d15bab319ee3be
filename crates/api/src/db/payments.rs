//! Payment repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pitchside_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::Payment;

pub(crate) const PAYMENT_COLUMNS: &str =
    "id, order_id, user_id, method, amount, status, created_at";

/// Raw `payments` row.
#[derive(sqlx::FromRow)]
pub(crate) struct PaymentRow {
    pub id: i32,
    pub order_id: i32,
    pub user_id: i32,
    pub method: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRow {
    pub(crate) fn into_payment(self) -> Result<Payment, RepositoryError> {
        let method: PaymentMethod = self.method.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;
        let status: PaymentStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Payment {
            id: PaymentId::new(self.id),
            order_id: OrderId::new(self.order_id),
            user_id: UserId::new(self.user_id),
            method,
            amount: Money::new(self.amount),
            status,
            created_at: self.created_at,
        })
    }
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the payment linked to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    /// Delete the payment linked to an order (order cancellation).
    ///
    /// Deleting a payment that doesn't exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_order(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM payments WHERE order_id = $1")
            .bind(order_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// List a user's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }

    /// List every payment, newest first (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }
}
