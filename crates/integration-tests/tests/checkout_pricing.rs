//! Integration tests for server-side checkout pricing and validation.
//!
//! The server is the source of truth for pricing: subtotals come from catalog
//! prices, the shipping fee from the threshold rule, and client-declared
//! totals are ignored. These tests pin that arithmetic and the request
//! validation messages.

use rust_decimal::Decimal;

use pitchside_core::{Money, PaymentMethod};

use pitchside_api::models::ShippingAddress;
use pitchside_api::services::orders::{
    FREE_SHIPPING_THRESHOLD, OrderError, STANDARD_SHIPPING_FEE, shipping_fee, validate_shipping,
};

fn good_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Suman Rai".to_owned(),
        phone: "9812345678".to_owned(),
        address: "Baneshwor".to_owned(),
        city: "Kathmandu".to_owned(),
        postal_code: Some("44600".to_owned()),
    }
}

// =============================================================================
// Shipping Fee Rule
// =============================================================================

#[test]
fn test_flat_fee_up_to_and_including_threshold() {
    assert_eq!(shipping_fee(Money::ZERO), Money::new(STANDARD_SHIPPING_FEE));
    assert_eq!(
        shipping_fee(Money::from_rupees(999)),
        Money::new(STANDARD_SHIPPING_FEE)
    );
    // Exactly 1000 still pays the fee; only strictly-greater ships free
    assert_eq!(
        shipping_fee(Money::new(FREE_SHIPPING_THRESHOLD)),
        Money::new(STANDARD_SHIPPING_FEE)
    );
}

#[test]
fn test_free_shipping_above_threshold() {
    assert_eq!(
        shipping_fee(Money::new(Decimal::new(100_001, 2))), // 1000.01
        Money::ZERO
    );
    assert_eq!(shipping_fee(Money::from_rupees(5000)), Money::ZERO);
}

#[test]
fn test_order_total_arithmetic() {
    // Two units at 249.50 plus one at 501.00 -> 1000.00 subtotal, fee applies
    let subtotal = Money::new(Decimal::new(24_950, 2)) * 2 + Money::new(Decimal::new(50_100, 2));
    assert_eq!(subtotal, Money::from_rupees(1000));

    let total = subtotal + shipping_fee(subtotal);
    assert_eq!(total, Money::from_rupees(1100));
}

// =============================================================================
// Payment Method
// =============================================================================

#[test]
fn test_payment_method_wire_values() {
    assert_eq!("cod".parse::<PaymentMethod>().ok(), Some(PaymentMethod::Cod));
    assert_eq!(
        "online".parse::<PaymentMethod>().ok(),
        Some(PaymentMethod::Online)
    );
    assert!("card".parse::<PaymentMethod>().is_err());
    assert!("COD".parse::<PaymentMethod>().is_err());
}

// =============================================================================
// Shipping Address Validation
// =============================================================================

#[test]
fn test_good_address_passes() {
    assert!(validate_shipping(&good_address()).is_ok());
}

#[test]
fn test_each_field_has_its_own_message() {
    let cases: [(&str, Box<dyn Fn(&mut ShippingAddress)>); 5] = [
        ("Full Name is required", Box::new(|a| a.full_name = "  ".into())),
        ("Phone must be 10 digits", Box::new(|a| a.phone = "981234".into())),
        ("Phone must be numeric", Box::new(|a| a.phone = "98-1234567".into())),
        ("Address is required", Box::new(|a| a.address = String::new())),
        ("City is required", Box::new(|a| a.city = " ".into())),
    ];

    for (expected, mutate) in cases {
        let mut address = good_address();
        mutate(&mut address);
        match validate_shipping(&address) {
            Err(OrderError::Validation(message)) => assert_eq!(message, expected),
            other => panic!("expected validation failure '{expected}', got {other:?}"),
        }
    }
}

#[test]
fn test_phone_rejects_eleven_digits() {
    let mut address = good_address();
    address.phone = "98123456789".to_owned();
    assert!(matches!(
        validate_shipping(&address),
        Err(OrderError::Validation(message)) if message == "Phone must be 10 digits"
    ));
}
