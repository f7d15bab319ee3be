//! Order workflow service.
//!
//! Converts a cart or a buy-now item list into an order with a linked
//! payment record. The sequence is: validate → price from product records →
//! reserve stock (all-or-nothing) → persist order+payment → clear cart →
//! notify admins.
//!
//! Stock reservation is the one concurrency-sensitive step: each line takes a
//! single conditional decrement, so two checkouts racing for the last unit
//! serialize on the product row. If any line fails to reserve, every
//! reservation already taken is compensated before the error returns -
//! a multi-item order never leaves stock partially decremented.
//!
//! Cancellation and admin status changes live here too; status changes are
//! validated against [`OrderStatus::can_transition_to`].

mod error;

pub use error::OrderError;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use pitchside_core::{Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId};

use crate::db::{
    NotificationRepository, OrderRepository, PaymentRepository, ProductRepository, UserRepository,
};
use crate::models::{
    NewNotification, NewOrder, NewOrderItem, Order, Payment, ShippingAddress, User,
};

/// Orders above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Flat fee below the free-shipping threshold.
pub const STANDARD_SHIPPING_FEE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Checkout request body.
///
/// Client-declared `subtotal`/`shippingFee`/`total` are accepted for wire
/// compatibility but ignored - pricing is always recomputed from product
/// records server-side. Buy-now items likewise only contribute product id,
/// quantity, and size; unit prices come from the catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(default)]
    pub items: Option<Vec<DirectItem>>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub shipping_fee: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// One buy-now line in a checkout request.
#[derive(Debug, Deserialize)]
pub struct DirectItem {
    pub product: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
}

/// Order workflow service.
pub struct OrderService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    payments: PaymentRepository<'a>,
    notifications: NotificationRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            payments: PaymentRepository::new(pool),
            notifications: NotificationRepository::new(pool),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place an order from the user's cart or from buy-now items.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad shipping/payment fields, `EmptyCart`,
    /// `UnknownProduct`, or `InsufficientStock`. On `InsufficientStock` any
    /// stock already reserved for earlier lines has been restored.
    pub async fn place_order(
        &self,
        user: &User,
        request: &PlaceOrderRequest,
    ) -> Result<(Order, Payment), OrderError> {
        validate_shipping(&request.shipping_address)?;
        let payment_method: PaymentMethod = request
            .payment_method
            .parse()
            .map_err(|_| OrderError::Validation("Invalid payment method".to_owned()))?;

        let direct_items = request.items.as_deref().filter(|items| !items.is_empty());
        let from_cart = direct_items.is_none();

        let lines = match direct_items {
            Some(items) => self.lines_from_direct(items).await?,
            None => self.lines_from_cart(user).await?,
        };
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let subtotal: Money = lines.iter().map(|line| line.price * line.quantity).sum();
        let shipping_fee = shipping_fee(subtotal);
        let total = subtotal + shipping_fee;

        self.reserve_all(&lines).await?;

        let new_order = NewOrder {
            user_id: user.id,
            items: lines,
            shipping_address: request.shipping_address.clone(),
            payment_method,
            subtotal,
            shipping_fee,
            total,
            payment_status: PaymentStatus::Pending,
            order_status: initial_status(payment_method),
        };

        let (order, payment) = match self.orders.create(&new_order).await {
            Ok(pair) => pair,
            Err(e) => {
                // Persisting failed after the stock was taken; give it back.
                self.release(&new_order.items).await;
                return Err(e.into());
            }
        };

        if from_cart {
            self.users.clear_cart(user.id).await?;
        }

        self.notifications
            .create(&NewNotification {
                kind: "order".to_owned(),
                message: format!(
                    "New order {} from {} - {} ({})",
                    order.order_number,
                    user.name,
                    order.total,
                    payment_method.to_string().to_uppercase()
                ),
                user_id: None,
                link: "/admin".to_owned(),
                metadata: json!({ "orderId": order.id, "userId": user.id }),
            })
            .await?;

        tracing::info!(
            order = %order.order_number,
            user = %user.email,
            total = %order.total,
            "order placed"
        );

        Ok((order, payment))
    }

    /// Build lines from buy-now items, pricing each from the catalog.
    async fn lines_from_direct(
        &self,
        items: &[DirectItem],
    ) -> Result<Vec<NewOrderItem>, OrderError> {
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity <= 0 {
                return Err(OrderError::Validation(
                    "Quantity must be at least 1".to_owned(),
                ));
            }

            let product = self
                .products
                .get(item.product)
                .await?
                .ok_or_else(|| OrderError::UnknownProduct(format!("#{}", item.product)))?;

            if !product.is_orderable() {
                return Err(OrderError::Validation(format!(
                    "Product {} is not available",
                    product.name
                )));
            }
            if product.stock < item.quantity {
                return Err(OrderError::InsufficientStock(product.name));
            }

            lines.push(NewOrderItem {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: item.quantity,
                image: product.image,
                size: item.size.clone(),
            });
        }
        Ok(lines)
    }

    /// Build lines from the persisted cart.
    ///
    /// Entries whose product is missing or inactive are skipped silently;
    /// an out-of-stock entry fails the whole checkout.
    async fn lines_from_cart(&self, user: &User) -> Result<Vec<NewOrderItem>, OrderError> {
        let entries = self.users.list_cart(user.id).await?;
        if entries.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(product) = entry.product else {
                continue;
            };
            if !product.is_orderable() {
                continue;
            }
            if product.stock < entry.item.quantity {
                return Err(OrderError::InsufficientStock(product.name));
            }

            lines.push(NewOrderItem {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: entry.item.quantity,
                image: product.image,
                size: entry.item.size,
            });
        }
        Ok(lines)
    }

    /// Reserve stock for every line, compensating on the first failure so
    /// the order is all-or-nothing.
    async fn reserve_all(&self, lines: &[NewOrderItem]) -> Result<(), OrderError> {
        let mut reserved: Vec<&NewOrderItem> = Vec::with_capacity(lines.len());
        for line in lines {
            let ok = match self.products.reserve_stock(line.product_id, line.quantity).await {
                Ok(ok) => ok,
                Err(e) => {
                    self.release_refs(&reserved).await;
                    return Err(e.into());
                }
            };
            if !ok {
                // Lost the race (or the pre-check was stale); undo and fail.
                self.release_refs(&reserved).await;
                return Err(OrderError::InsufficientStock(line.name.clone()));
            }
            reserved.push(line);
        }
        Ok(())
    }

    /// Best-effort restore of reserved stock.
    async fn release(&self, lines: &[NewOrderItem]) {
        self.release_refs(&lines.iter().collect::<Vec<_>>()).await;
    }

    async fn release_refs(&self, lines: &[&NewOrderItem]) {
        for line in lines {
            if let Err(e) = self
                .products
                .restore_stock(line.product_id, line.quantity)
                .await
            {
                tracing::error!(
                    product = %line.product_id,
                    quantity = line.quantity,
                    error = %e,
                    "failed to restore reserved stock"
                );
            }
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Cancel an order: restore stock, delete the payment, delete the order.
    ///
    /// Owners may only cancel `pending` orders; admins may cancel anything.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `NotCancellable`.
    pub async fn cancel_order(
        &self,
        requester: &User,
        order_id: OrderId,
    ) -> Result<(), OrderError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let is_owner = order.user_id == requester.id;
        let is_admin = requester.role.is_admin();
        if !is_owner && !is_admin {
            return Err(OrderError::Forbidden);
        }
        if !is_admin && order.order_status != OrderStatus::Pending {
            return Err(OrderError::NotCancellable);
        }

        for item in &order.items {
            self.products
                .restore_stock(item.product_id, item.quantity)
                .await?;
        }

        self.payments.delete_by_order(order.id).await?;
        self.orders.delete(order.id).await?;

        tracing::info!(order = %order.order_number, by = %requester.email, "order cancelled");
        Ok(())
    }

    // =========================================================================
    // Admin status workflow
    // =========================================================================

    /// Transition an order's status, notifying the buyer where the lifecycle
    /// calls for it.
    ///
    /// Writing the current status again is a no-op; anything not in the
    /// transition table is rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InvalidTransition`.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let old_status = order.order_status;
        if old_status == new_status {
            return Ok(order);
        }
        if !old_status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        }

        self.orders.update_status(order.id, new_status).await?;
        order.order_status = new_status;

        if let Some(message) = status_notification_message(new_status, &order.order_number, Utc::now())
        {
            self.notifications
                .create(&NewNotification {
                    kind: "order".to_owned(),
                    message,
                    user_id: Some(order.user_id),
                    link: format!("/orders/{}", order.id),
                    metadata: json!({
                        "orderId": order.id,
                        "orderNumber": order.order_number,
                        "oldStatus": old_status,
                        "newStatus": new_status,
                    }),
                })
                .await?;
        }

        Ok(order)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// A user's own orders, newest first, with payments attached.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on database failure.
    pub async fn my_orders(
        &self,
        user: &User,
    ) -> Result<Vec<(Order, Option<Payment>)>, OrderError> {
        Ok(self.orders.list_for_user(user.id).await?)
    }

    /// A single order, visible to its owner or an admin.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    pub async fn get_order(&self, requester: &User, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.user_id != requester.id && !requester.role.is_admin() {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    /// Every order in the store (admin).
    ///
    /// # Errors
    ///
    /// Returns `Repository` on database failure.
    pub async fn all_orders(&self) -> Result<Vec<(Order, Option<Payment>)>, OrderError> {
        Ok(self.orders.list_all().await?)
    }
}

// =============================================================================
// Pure pricing / validation helpers
// =============================================================================

/// Shipping is free above [`FREE_SHIPPING_THRESHOLD`], otherwise a flat
/// [`STANDARD_SHIPPING_FEE`].
#[must_use]
pub fn shipping_fee(subtotal: Money) -> Money {
    if subtotal.amount() > FREE_SHIPPING_THRESHOLD {
        Money::ZERO
    } else {
        Money::new(STANDARD_SHIPPING_FEE)
    }
}

/// Cash-on-delivery orders confirm immediately; online orders start pending.
#[must_use]
pub const fn initial_status(method: PaymentMethod) -> OrderStatus {
    match method {
        PaymentMethod::Cod => OrderStatus::Confirmed,
        PaymentMethod::Online => OrderStatus::Pending,
    }
}

/// Validate the shipping address fields.
///
/// # Errors
///
/// Returns `OrderError::Validation` with a field-specific message.
pub fn validate_shipping(address: &ShippingAddress) -> Result<(), OrderError> {
    if address.full_name.trim().is_empty() {
        return Err(OrderError::Validation("Full Name is required".to_owned()));
    }

    let phone = address.phone.trim();
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(OrderError::Validation("Phone must be numeric".to_owned()));
    }
    if phone.len() != 10 {
        return Err(OrderError::Validation("Phone must be 10 digits".to_owned()));
    }

    if address.address.trim().is_empty() {
        return Err(OrderError::Validation("Address is required".to_owned()));
    }
    if address.city.trim().is_empty() {
        return Err(OrderError::Validation("City is required".to_owned()));
    }

    Ok(())
}

/// The buyer-facing message for a status change, or `None` when the status
/// doesn't notify.
#[must_use]
pub fn status_notification_message(
    status: OrderStatus,
    order_number: &str,
    now: DateTime<Utc>,
) -> Option<String> {
    let action = match status {
        OrderStatus::Processing => "Your order is being processed",
        OrderStatus::Delivered => "Your order has been delivered",
        OrderStatus::Pending | OrderStatus::Confirmed => return None,
    };

    let date = now.format("%B %-d, %Y");
    let day = now.format("%A");
    let time = now.format("%I:%M:%S %p");
    Some(format!("{action}. Order #{order_number} - {date}, {day}, {time}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Suman Rai".to_owned(),
            phone: "9812345678".to_owned(),
            address: "Baneshwor".to_owned(),
            city: "Kathmandu".to_owned(),
            postal_code: None,
        }
    }

    #[test]
    fn test_shipping_fee_boundary() {
        // Exactly at the threshold still pays the flat fee
        assert_eq!(
            shipping_fee(Money::from_rupees(1000)),
            Money::from_rupees(100)
        );
        assert_eq!(
            shipping_fee(Money::new(Decimal::new(100_001, 2))), // 1000.01
            Money::ZERO
        );
        assert_eq!(
            shipping_fee(Money::from_rupees(250)),
            Money::from_rupees(100)
        );
    }

    #[test]
    fn test_initial_status_by_payment_method() {
        assert_eq!(initial_status(PaymentMethod::Cod), OrderStatus::Confirmed);
        assert_eq!(initial_status(PaymentMethod::Online), OrderStatus::Pending);
    }

    #[test]
    fn test_validate_shipping_accepts_good_address() {
        assert!(validate_shipping(&address()).is_ok());
    }

    #[test]
    fn test_validate_shipping_rejects_missing_fields() {
        let mut bad = address();
        bad.full_name = "  ".to_owned();
        assert!(matches!(
            validate_shipping(&bad),
            Err(OrderError::Validation(msg)) if msg == "Full Name is required"
        ));

        let mut bad = address();
        bad.address = String::new();
        assert!(matches!(
            validate_shipping(&bad),
            Err(OrderError::Validation(msg)) if msg == "Address is required"
        ));

        let mut bad = address();
        bad.city = String::new();
        assert!(matches!(
            validate_shipping(&bad),
            Err(OrderError::Validation(msg)) if msg == "City is required"
        ));
    }

    #[test]
    fn test_validate_shipping_rejects_bad_phone() {
        let mut bad = address();
        bad.phone = "98123".to_owned();
        assert!(matches!(
            validate_shipping(&bad),
            Err(OrderError::Validation(msg)) if msg == "Phone must be 10 digits"
        ));

        let mut bad = address();
        bad.phone = "98123456ab".to_owned();
        assert!(matches!(
            validate_shipping(&bad),
            Err(OrderError::Validation(msg)) if msg == "Phone must be numeric"
        ));
    }

    #[test]
    fn test_status_notification_message_formats_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 10, 30, 0).unwrap();
        let message =
            status_notification_message(OrderStatus::Processing, "PS-000042", at).unwrap();
        assert_eq!(
            message,
            "Your order is being processed. Order #PS-000042 - January 5, 2026, Monday, 10:30:00 AM"
        );
    }

    #[test]
    fn test_status_notification_only_for_processing_and_delivered() {
        let now = Utc::now();
        assert!(status_notification_message(OrderStatus::Pending, "PS-1", now).is_none());
        assert!(status_notification_message(OrderStatus::Confirmed, "PS-1", now).is_none());
        assert!(status_notification_message(OrderStatus::Processing, "PS-1", now).is_some());
        assert!(status_notification_message(OrderStatus::Delivered, "PS-1", now).is_some());
    }
}
