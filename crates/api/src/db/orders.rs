//! Order repository.
//!
//! Order, line items, and the linked payment are persisted in one database
//! transaction; stock reservation happens before this and is compensated by
//! the service layer if persistence fails.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pitchside_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod,
    PaymentStatus, ProductId, UserId};

use super::RepositoryError;
use super::payments::{PAYMENT_COLUMNS, PaymentRow};
use crate::models::{NewOrder, Order, OrderItem, Payment, ShippingAddress};

const ORDER_COLUMNS: &str = "id, order_number, user_id, ship_full_name, ship_phone, \
     ship_address, ship_city, ship_postal, payment_method, subtotal, shipping_fee, total, \
     payment_status, order_status, payment_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name, price, quantity, image, size";

/// Raw `orders` row.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    ship_full_name: String,
    ship_phone: String,
    ship_address: String,
    ship_city: String,
    ship_postal: Option<String>,
    payment_method: String,
    subtotal: Decimal,
    shipping_fee: Decimal,
    total: Decimal,
    payment_status: String,
    order_status: String,
    payment_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let payment_method: PaymentMethod = self.payment_method.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;
        let payment_status: PaymentStatus = self.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;
        let order_status: OrderStatus = self.order_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            items,
            shipping_address: ShippingAddress {
                full_name: self.ship_full_name,
                phone: self.ship_phone,
                address: self.ship_address,
                city: self.ship_city,
                postal_code: self.ship_postal,
            },
            payment_method,
            subtotal: Money::new(self.subtotal),
            shipping_fee: Money::new(self.shipping_fee),
            total: Money::new(self.total),
            payment_status,
            order_status,
            payment_id: self.payment_id.map(PaymentId::new),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Raw `order_items` row.
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    name: String,
    price: Decimal,
    quantity: i32,
    image: String,
    size: Option<String>,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(self.id),
            product_id: ProductId::new(self.product_id),
            name: self.name,
            price: Money::new(self.price),
            quantity: self.quantity,
            image: self.image,
            size: self.size,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order together with its line items and payment record,
    /// linking the payment back onto the order. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails (the
    /// transaction rolls back).
    pub async fn create(&self, new: &NewOrder) -> Result<(Order, Payment), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO orders (user_id, ship_full_name, ship_phone, ship_address, \
                 ship_city, ship_postal, payment_method, subtotal, shipping_fee, total, \
                 payment_status, order_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING id",
        )
        .bind(new.user_id)
        .bind(&new.shipping_address.full_name)
        .bind(&new.shipping_address.phone)
        .bind(&new.shipping_address.address)
        .bind(&new.shipping_address.city)
        .bind(&new.shipping_address.postal_code)
        .bind(new.payment_method.to_string())
        .bind(new.subtotal)
        .bind(new.shipping_fee)
        .bind(new.total)
        .bind(new.payment_status.to_string())
        .bind(new.order_status.to_string())
        .fetch_one(&mut *tx)
        .await?;

        // The human-facing reference is derived from the id, so it is filled
        // in after the insert within the same transaction.
        sqlx::query("UPDATE orders SET order_number = $1 WHERE id = $2")
            .bind(format!("PS-{order_id:06}"))
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        for item in &new.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, price, quantity, image, size) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(&item.image)
            .bind(&item.size)
            .execute(&mut *tx)
            .await?;
        }

        let payment_id: i32 = sqlx::query_scalar(
            "INSERT INTO payments (order_id, user_id, method, amount, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(order_id)
        .bind(new.user_id)
        .bind(new.payment_method.to_string())
        .bind(new.total)
        .bind(PaymentStatus::Pending.to_string())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET payment_id = $1 WHERE id = $2")
            .bind(payment_id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let item_rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let payment_row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = item_rows.into_iter().map(ItemRow::into_item).collect();
        Ok((order_row.into_order(items)?, payment_row.into_payment()?))
    }

    /// Get an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(ItemRow::into_item)
        .collect();

        Ok(Some(row.into_order(items)?))
    }

    /// List a user's orders, newest first, with payments attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Option<Payment>)>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List every order, newest first, with payments attached (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<(Order, Option<Payment>)>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Overwrite an order's status.
    ///
    /// Transition validity is the service layer's concern; this method only
    /// persists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET order_status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status.to_string())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an order (cancellation). Line items cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Attach items and payments to a page of order rows.
    async fn assemble(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<(Order, Option<Payment>)>, RepositoryError> {
        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into_item());
        }

        let payment_rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ANY($1)"
        ))
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut payments_by_order: HashMap<i32, Payment> = HashMap::new();
        for payment in payment_rows {
            payments_by_order.insert(payment.order_id, payment.into_payment()?);
        }

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            let items = items_by_order.remove(&id).unwrap_or_default();
            orders.push((row.into_order(items)?, payments_by_order.remove(&id)));
        }
        Ok(orders)
    }
}
