//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pitchside_core::{AddressId, CartItemId, Email, ProductId, UserId, UserRole};

use super::product::Product;

/// A storefront account (domain type).
///
/// The password hash and any pending OTP are deliberately not part of this
/// struct; repositories return them only through dedicated methods, mirroring
/// the write-only treatment those fields get in the schema.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique, stored lowercased).
    pub email: Email,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// Consecutive failed login attempts since the last success.
    pub login_attempts: i32,
    /// If set and in the future, the account is locked until this instant.
    pub lock_until: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The public projection of this account returned by the API.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
        }
    }
}

/// The user fields exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// A pending one-time passcode attached to an account.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    /// The 6-digit code.
    pub code: String,
    /// Instant after which the code no longer verifies.
    pub expires: DateTime<Utc>,
}

/// One entry in a user's cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
}

/// A cart entry joined with its product.
///
/// The product is `None` when it has been deleted since being added to the
/// cart; checkout skips such entries silently.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

/// A saved shipping address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub is_default: bool,
}
