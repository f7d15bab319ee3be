//! Request middleware: bearer-token authentication extractors and rate
//! limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::{CurrentUser, RequireAdmin};
pub use rate_limit::order_rate_limiter;
