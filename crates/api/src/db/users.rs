//! User repository: accounts, login-attempt state, OTPs, carts, addresses.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pitchside_core::{AddressId, CartItemId, Email, ProductId, UserId, UserRole};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::{Address, CartEntry, CartItem, OtpChallenge, User};

const USER_COLUMNS: &str = "id, name, email, phone, role, login_attempts, lock_until, \
     created_at, updated_at";

/// Raw `users` row. Converted to [`User`] after validating stored values.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: UserRole = self
            .role
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role in database: {e}")))?;

        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email,
            phone: self.phone,
            role,
            login_attempts: self.login_attempts,
            lock_until: self.lock_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    otp_code: Option<String>,
    otp_expires: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    full_name: String,
    phone: String,
    address: String,
    city: String,
    postal_code: Option<String>,
    is_default: bool,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Self {
            id: AddressId::new(r.id),
            full_name: r.full_name,
            phone: r.phone,
            address: r.address,
            city: r.city,
            postal_code: r.postal_code,
            is_default: r.is_default,
        }
    }
}

/// Cart entry joined with its product (nullable - the product may be gone).
#[derive(sqlx::FromRow)]
struct CartJoinRow {
    id: i32,
    product_id: i32,
    quantity: i32,
    size: Option<String>,
    #[sqlx(flatten)]
    product: OptionalProductRow,
}

#[derive(sqlx::FromRow)]
struct OptionalProductRow {
    p_id: Option<i32>,
    p_name: Option<String>,
    p_price: Option<rust_decimal::Decimal>,
    p_original_price: Option<rust_decimal::Decimal>,
    p_stock: Option<i32>,
    p_status: Option<String>,
    p_image: Option<String>,
    p_images: Option<Vec<String>>,
    p_category: Option<String>,
    p_created_at: Option<DateTime<Utc>>,
    p_updated_at: Option<DateTime<Utc>>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        phone: Option<&str>,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, phone, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_email)?;

        row.into_user()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user together with their password hash, by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AuthRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.into_user()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Record a failed login: store the new attempt count and, when the
    /// account is being locked, the lock expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn record_failed_login(
        &self,
        id: UserId,
        attempts: i32,
        lock_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET login_attempts = $2, lock_until = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(attempts)
        .bind(lock_until)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Reset the failed-login counter and clear any lock (successful login).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn reset_login_attempts(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET login_attempts = 0, lock_until = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // One-time passcodes
    // =========================================================================

    /// Store a pending OTP for the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_otp(
        &self,
        id: UserId,
        code: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET otp_code = $2, otp_expires = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Clear any pending OTP (after verification, or to roll back a failed
    /// dispatch).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn clear_otp(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET otp_code = NULL, otp_expires = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Fetch the user's pending OTP, if both fields are set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_otp(&self, id: UserId) -> Result<Option<OtpChallenge>, RepositoryError> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT otp_code, otp_expires FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        match (row.otp_code, row.otp_expires) {
            (Some(code), Some(expires)) => Ok(Some(OtpChallenge { code, expires })),
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update name and/or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email is already in use.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(map_unique_email)?
        .ok_or(RepositoryError::NotFound)?;

        row.into_user()
    }

    /// Replace the stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// List the user's cart, each entry joined with its product (if it still
    /// exists).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_cart(&self, id: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartJoinRow>(
            "SELECT c.id, c.product_id, c.quantity, c.size, \
                    p.id AS p_id, p.name AS p_name, p.price AS p_price, \
                    p.original_price AS p_original_price, p.stock AS p_stock, \
                    p.status AS p_status, p.image AS p_image, p.images AS p_images, \
                    p.category AS p_category, p.created_at AS p_created_at, \
                    p.updated_at AS p_updated_at \
             FROM cart_items c \
             LEFT JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = $1 \
             ORDER BY c.id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for r in rows {
            let product = match r.product.into_product_row() {
                Some(p) => Some(p.into_product()?),
                None => None,
            };
            entries.push(CartEntry {
                item: CartItem {
                    id: CartItemId::new(r.id),
                    product_id: ProductId::new(r.product_id),
                    quantity: r.quantity,
                    size: r.size,
                },
                product,
            });
        }
        Ok(entries)
    }

    /// Add a product to the cart, merging quantities with an existing entry
    /// for the same product and size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_cart_item(
        &self,
        id: UserId,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE cart_items SET quantity = quantity + $3 \
             WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $4",
        )
        .bind(id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO cart_items (user_id, product_id, quantity, size) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(product_id)
            .bind(quantity)
            .bind(size)
            .execute(self.pool)
            .await?;
        }
        Ok(())
    }

    /// Set the quantity of an existing cart entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist.
    pub async fn set_cart_quantity(
        &self,
        id: UserId,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 \
             WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $4",
        )
        .bind(id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a product from the cart (all sizes when `size` is `None`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing matched.
    pub async fn remove_cart_item(
        &self,
        id: UserId,
        product_id: ProductId,
        size: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = match size {
            Some(size) => {
                sqlx::query(
                    "DELETE FROM cart_items \
                     WHERE user_id = $1 AND product_id = $2 AND size = $3",
                )
                .bind(id)
                .bind(product_id)
                .bind(size)
                .execute(self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
                    .bind(id)
                    .bind(product_id)
                    .execute(self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Empty the user's cart (after a successful cart-sourced order).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_cart(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// List the user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_addresses(&self, id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT id, full_name, phone, address, city, postal_code, is_default \
             FROM addresses WHERE user_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_address(
        &self,
        id: UserId,
        full_name: &str,
        phone: &str,
        address: &str,
        city: &str,
        postal_code: Option<&str>,
        is_default: bool,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            "INSERT INTO addresses (user_id, full_name, phone, address, city, postal_code, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, full_name, phone, address, city, postal_code, is_default",
        )
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .bind(address)
        .bind(city)
        .bind(postal_code)
        .bind(is_default)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn delete_address(
        &self,
        id: UserId,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl OptionalProductRow {
    /// Collapse the LEFT JOIN columns into a `ProductRow` when the product
    /// side matched.
    fn into_product_row(self) -> Option<ProductRow> {
        Some(ProductRow {
            id: self.p_id?,
            name: self.p_name?,
            price: self.p_price?,
            original_price: self.p_original_price,
            stock: self.p_stock?,
            status: self.p_status?,
            image: self.p_image?,
            images: self.p_images?,
            category: self.p_category?,
            created_at: self.p_created_at?,
            updated_at: self.p_updated_at?,
        })
    }
}

/// Map a unique-violation on the email column to `Conflict`.
fn map_unique_email(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("email already exists".to_owned());
    }
    RepositoryError::Database(e)
}
