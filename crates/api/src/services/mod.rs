//! Business logic services.
//!
//! Services sit between route handlers and repositories: routes parse the
//! request and pick the service call, services own the workflow rules
//! (lockout windows, OTP lifecycles, stock reservation, status transitions),
//! repositories own the SQL.

pub mod auth;
pub mod email;
pub mod orders;
pub mod token;

pub use auth::{AuthError, AuthService, LoginOutcome};
pub use email::{EmailError, EmailService};
pub use orders::{OrderError, OrderService};
pub use token::{TokenError, TokenService};
