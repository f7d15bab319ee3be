//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (verifies database)
//!
//! # Auth (public)
//! POST /api/auth/register          - Register, returns token
//! POST /api/auth/login             - Login, returns token or otpRequired
//! POST /api/auth/verify-otp        - Verify login OTP, returns token
//! POST /api/auth/google            - Google sign-in (find-or-create)
//!
//! # Account (bearer token)
//! GET  /api/auth/me                - Current user
//! PUT  /api/auth/update-profile    - Update name/email
//! PUT  /api/auth/change-password   - Change password
//! GET  /api/auth/addresses         - Saved addresses
//! POST /api/auth/addresses         - Save an address
//! DELETE /api/auth/addresses/{id}  - Delete an address
//! GET  /api/auth/notifications     - Own notifications
//! PUT  /api/auth/notifications/{id}/read
//! DELETE /api/auth/notifications/{id}
//!
//! # Cart (bearer token)
//! GET  /api/cart                   - Cart contents with products
//! POST /api/cart                   - Add item
//! PUT  /api/cart/{product_id}      - Set quantity
//! DELETE /api/cart/{product_id}    - Remove item
//!
//! # Orders (bearer token)
//! POST /api/orders                 - Checkout (rate-limited 5/15min per IP)
//! GET  /api/orders/my-orders       - Own orders
//! GET  /api/orders/{id}            - Single order (owner or admin)
//! DELETE /api/orders/{id}          - Cancel (owner: pending only; admin: any)
//! PUT  /api/orders/{id}/status     - Status transition (admin)
//! GET  /api/orders/admin/all       - All orders (admin)
//!
//! # Payments (bearer token)
//! GET  /api/payments/my            - Own payment records
//! GET  /api/payments/admin/all     - All payment records (admin)
//!
//! # Admin notifications (admin)
//! GET  /api/admin/notifications
//! PUT  /api/admin/notifications/{id}/read
//! DELETE /api/admin/notifications/{id}
//! ```

pub mod auth;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod payments;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::order_rate_limiter;
use crate::state::AppState;

/// Create the auth + account routes router (`/api/auth`).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/google", post(auth::google))
        .route("/me", get(auth::me))
        .route("/update-profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .route(
            "/addresses",
            get(auth::list_addresses).post(auth::add_address),
        )
        .route("/addresses/{id}", delete(auth::delete_address))
        .route("/notifications", get(notifications::my_notifications))
        .route(
            "/notifications/{id}/read",
            put(notifications::mark_my_notification_read),
        )
        .route(
            "/notifications/{id}",
            delete(notifications::delete_my_notification),
        )
}

/// Create the cart routes router (`/api/cart`).
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route(
            "/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the order routes router (`/api/orders`).
///
/// Checkout gets its own sub-router so the rate limiter wraps only order
/// creation.
pub fn order_routes() -> Router<AppState> {
    let create = Router::new()
        .route("/", post(orders::create))
        .layer(order_rate_limiter());

    Router::new()
        .merge(create)
        .route("/my-orders", get(orders::my_orders))
        .route("/admin/all", get(orders::admin_all))
        .route("/{id}", get(orders::show).delete(orders::cancel))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the payment routes router (`/api/payments`).
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/my", get(payments::my_payments))
        .route("/admin/all", get(payments::admin_all))
}

/// Create the admin routes router (`/api/admin`).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notifications::admin_notifications))
        .route(
            "/notifications/{id}/read",
            put(notifications::mark_admin_notification_read),
        )
        .route(
            "/notifications/{id}",
            delete(notifications::delete_admin_notification),
        )
}
