//! Payment domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pitchside_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

/// A payment record, created 1:1 with its order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
