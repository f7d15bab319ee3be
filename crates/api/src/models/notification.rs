//! Notification domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pitchside_core::{NotificationId, UserId};

/// A notification row.
///
/// Rows without a `user_id` are admin-facing; rows with one belong to that
/// user and are only visible to (and deletable by) them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub kind: String,
    pub message: String,
    pub user_id: Option<UserId>,
    pub link: String,
    pub metadata: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub message: String,
    /// `None` for admin-facing notifications.
    pub user_id: Option<UserId>,
    pub link: String,
    pub metadata: serde_json::Value,
}
