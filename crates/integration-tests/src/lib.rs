//! Integration tests for Pitchside.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pitchside-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_lifecycle` - Order status machine and cancellation rules
//! - `auth_flow` - Lockout windows, OTP validation, token codec
//! - `checkout_pricing` - Server-side pricing and checkout validation
//!
//! These tests exercise the workflow rules at the logic level - transition
//! tables, decision helpers, and codecs - without requiring a database or a
//! running server. End-to-end coverage against live `PostgreSQL` lives behind
//! the deployment pipeline, not in this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]
