//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use pitchside_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::{Order, Payment};
use crate::services::orders::{OrderService, PlaceOrderRequest};
use crate::state::AppState;

/// Checkout response: the created order and its payment record.
#[derive(Debug, Serialize)]
pub struct OrderPlacedResponse {
    pub order: Order,
    pub payment: Payment,
}

/// An order with its payment record attached (list views).
#[derive(Debug, Serialize)]
pub struct OrderWithPayment {
    #[serde(flatten)]
    pub order: Order,
    pub payment: Option<Payment>,
}

/// Status update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /api/orders`
///
/// Rate-limited to 5 orders per 15 minutes per client address.
///
/// # Errors
///
/// Returns 400 for validation, empty-cart, unknown-product, and
/// insufficient-stock failures.
pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>)> {
    let (order, payment) = OrderService::new(state.pool())
        .place_order(&user, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse { order, payment }),
    ))
}

/// `GET /api/orders/my-orders`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn my_orders(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithPayment>>> {
    let orders = OrderService::new(state.pool()).my_orders(&user).await?;

    Ok(Json(
        orders
            .into_iter()
            .map(|(order, payment)| OrderWithPayment { order, payment })
            .collect(),
    ))
}

/// `GET /api/orders/{id}`
///
/// # Errors
///
/// Returns 404 for unknown orders, 403 unless requester owns the order or is
/// admin.
pub async fn show(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .get_order(&user, order_id)
        .await?;
    Ok(Json(order))
}

/// `PUT /api/orders/{id}/status` (admin)
///
/// # Errors
///
/// Returns 404 for unknown orders, 400 for transitions outside the lifecycle
/// table.
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let new_status: OrderStatus = body
        .order_status
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order status".to_string()))?;

    let order = OrderService::new(state.pool())
        .update_status(order_id, new_status)
        .await?;
    Ok(Json(order))
}

/// `GET /api/orders/admin/all` (admin)
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn admin_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithPayment>>> {
    let orders = OrderService::new(state.pool()).all_orders().await?;

    Ok(Json(
        orders
            .into_iter()
            .map(|(order, payment)| OrderWithPayment { order, payment })
            .collect(),
    ))
}

/// `DELETE /api/orders/{id}`
///
/// # Errors
///
/// Returns 404 for unknown orders, 403 for other users' orders, 400 when a
/// non-admin cancels a non-pending order.
pub async fn cancel(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    OrderService::new(state.pool())
        .cancel_order(&user, order_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Order cancelled successfully".to_string(),
    }))
}
