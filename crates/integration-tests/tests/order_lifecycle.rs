//! Integration tests for the order lifecycle state machine.
//!
//! These verify the status transition table and the per-status behaviors the
//! admin workflow relies on, without requiring a database.

use pitchside_core::{OrderStatus, PaymentMethod};

use pitchside_api::services::orders::{initial_status, status_notification_message};

// =============================================================================
// Status Machine Tests
// =============================================================================

#[test]
fn test_order_status_enum_values() {
    // Verify all expected status values exist by using them
    assert!(matches!(OrderStatus::Pending, OrderStatus::Pending));
    assert!(matches!(OrderStatus::Confirmed, OrderStatus::Confirmed));
    assert!(matches!(OrderStatus::Processing, OrderStatus::Processing));
    assert!(matches!(OrderStatus::Delivered, OrderStatus::Delivered));
}

/// Valid state transitions for orders.
/// Pending -> Confirmed -> Processing -> Delivered
/// Pending -> Processing (admin may skip confirmation)
#[test]
fn test_valid_state_transitions() {
    let valid_transitions = [
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Pending, OrderStatus::Processing),
        (OrderStatus::Confirmed, OrderStatus::Processing),
        (OrderStatus::Processing, OrderStatus::Delivered),
    ];

    for (from, to) in valid_transitions {
        assert!(
            from.can_transition_to(to),
            "expected {from} -> {to} to be allowed"
        );
    }
}

#[test]
fn test_invalid_state_transitions() {
    let invalid_transitions = [
        // No backwards movement
        (OrderStatus::Confirmed, OrderStatus::Pending),
        (OrderStatus::Processing, OrderStatus::Pending),
        (OrderStatus::Processing, OrderStatus::Confirmed),
        (OrderStatus::Delivered, OrderStatus::Processing),
        // No skipping straight to delivered
        (OrderStatus::Pending, OrderStatus::Delivered),
        (OrderStatus::Confirmed, OrderStatus::Delivered),
    ];

    for (from, to) in invalid_transitions {
        assert!(
            !from.can_transition_to(to),
            "expected {from} -> {to} to be rejected"
        );
    }
}

#[test]
fn test_delivered_is_terminal() {
    assert!(OrderStatus::Delivered.is_terminal());
    for next in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
    ] {
        assert!(!OrderStatus::Delivered.can_transition_to(next));
        assert!(!next.is_terminal());
    }
}

#[test]
fn test_status_wire_format_is_lowercase() {
    for (status, expected) in [
        (OrderStatus::Pending, "\"pending\""),
        (OrderStatus::Confirmed, "\"confirmed\""),
        (OrderStatus::Processing, "\"processing\""),
        (OrderStatus::Delivered, "\"delivered\""),
    ] {
        let json = serde_json::to_string(&status).expect("serializes");
        assert_eq!(json, expected);
    }
}

// =============================================================================
// Initial Status
// =============================================================================

#[test]
fn test_cod_orders_confirm_immediately() {
    assert_eq!(initial_status(PaymentMethod::Cod), OrderStatus::Confirmed);
}

#[test]
fn test_online_orders_start_pending() {
    assert_eq!(initial_status(PaymentMethod::Online), OrderStatus::Pending);
}

// =============================================================================
// Buyer Notifications
// =============================================================================

#[test]
fn test_only_processing_and_delivered_notify_the_buyer() {
    let now = chrono::Utc::now();

    assert!(status_notification_message(OrderStatus::Pending, "PS-000001", now).is_none());
    assert!(status_notification_message(OrderStatus::Confirmed, "PS-000001", now).is_none());

    let processing =
        status_notification_message(OrderStatus::Processing, "PS-000001", now).expect("message");
    assert!(processing.starts_with("Your order is being processed. Order #PS-000001"));

    let delivered =
        status_notification_message(OrderStatus::Delivered, "PS-000001", now).expect("message");
    assert!(delivered.starts_with("Your order has been delivered. Order #PS-000001"));
}
