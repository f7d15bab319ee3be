//! Admin user management commands.

use tracing::info;

use pitchside_core::{Email, UserRole};

use pitchside_api::db::UserRepository;
use pitchside_api::services::auth::hash_password;

/// Create an admin user.
///
/// # Errors
///
/// Returns an error if the email is invalid, already registered, or the
/// database operation fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    phone: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|e| format!("invalid email: {e}"))?;
    let password_hash = hash_password(password).map_err(|e| format!("{e}"))?;

    let pool = super::connect().await?;
    let user = UserRepository::new(&pool)
        .create(name, &email, phone, &password_hash, UserRole::Admin)
        .await?;

    info!(id = %user.id, email = %user.email, "Admin user created");
    Ok(())
}
