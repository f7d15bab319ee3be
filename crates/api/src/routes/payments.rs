//! Payment record route handlers.
//!
//! Payments are created by the order workflow; these endpoints only read.

use axum::{Json, extract::State};

use crate::db::PaymentRepository;
use crate::error::Result;
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::Payment;
use crate::state::AppState;

/// `GET /api/payments/my`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn my_payments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>> {
    let payments = PaymentRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(payments))
}

/// `GET /api/payments/admin/all` (admin)
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn admin_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>> {
    let payments = PaymentRepository::new(state.pool()).list_all().await?;
    Ok(Json(payments))
}
