//! Notification route handlers.
//!
//! Users see only their own notifications; the admin endpoints operate on the
//! ownerless (admin-facing) rows created by the order workflow.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use pitchside_core::NotificationId;

use crate::db::{NotificationRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::Notification;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Notification not found".to_string()),
        other => AppError::Database(other),
    }
}

// =============================================================================
// User notifications
// =============================================================================

/// `GET /api/auth/notifications`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn my_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = NotificationRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(notifications))
}

/// `PUT /api/auth/notifications/{id}/read`
///
/// # Errors
///
/// Returns 404 when the notification doesn't exist or belongs to someone else.
pub async fn mark_my_notification_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationRepository::new(state.pool())
        .mark_read_for_user(id, user.id)
        .await
        .map_err(not_found)?;
    Ok(Json(notification))
}

/// `DELETE /api/auth/notifications/{id}`
///
/// # Errors
///
/// Returns 404 when the notification doesn't exist or belongs to someone else.
pub async fn delete_my_notification(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<MessageResponse>> {
    NotificationRepository::new(state.pool())
        .delete_for_user(id, user.id)
        .await
        .map_err(not_found)?;

    Ok(Json(MessageResponse {
        message: "Notification deleted successfully".to_string(),
    }))
}

// =============================================================================
// Admin notifications
// =============================================================================

/// `GET /api/admin/notifications` (admin)
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn admin_notifications(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = NotificationRepository::new(state.pool())
        .list_admin()
        .await?;
    Ok(Json(notifications))
}

/// `PUT /api/admin/notifications/{id}/read` (admin)
///
/// # Errors
///
/// Returns 404 when no admin notification matches.
pub async fn mark_admin_notification_read(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationRepository::new(state.pool())
        .mark_read_admin(id)
        .await
        .map_err(not_found)?;
    Ok(Json(notification))
}

/// `DELETE /api/admin/notifications/{id}` (admin)
///
/// # Errors
///
/// Returns 404 when no admin notification matches.
pub async fn delete_admin_notification(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<MessageResponse>> {
    NotificationRepository::new(state.pool())
        .delete_admin(id)
        .await
        .map_err(not_found)?;

    Ok(Json(MessageResponse {
        message: "Notification deleted successfully".to_string(),
    }))
}
