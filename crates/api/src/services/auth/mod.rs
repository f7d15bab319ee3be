//! Authentication service.
//!
//! Owns the login state machine: credential check, failed-attempt counting
//! with a 15-minute lockout, OTP issuance/verification for non-exempt
//! accounts, and session-token issuance.
//!
//! Per login attempt the flow is:
//!
//! ```text
//! credentials ──(no user)──────────► rejected ("Email is wrong")
//!             ──(lock active)──────► locked
//!             ──(wrong password)───► rejected / locked (4th failure)
//!             ──(admin or exempt)──► authenticated (token)
//!             ──(otherwise)────────► awaiting OTP (email dispatched)
//! ```
//!
//! Every transition persists to the user row; OTP issuance additionally has
//! the observable side effect of an outbound email, which rolls the stored
//! OTP back if dispatch fails.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;

use pitchside_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{OtpChallenge, User};
use crate::services::email::{self, EmailService};
use crate::services::token::TokenService;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Failed attempts allowed before the next failure locks the account.
pub const MAX_FAILED_ATTEMPTS: i32 = 3;

/// How long a locked account stays locked.
pub const LOCKOUT_MINUTES: i64 = 15;

/// How long an issued OTP stays valid.
pub const OTP_VALIDITY_MINUTES: i64 = 10;

/// Result of a login attempt that didn't fail outright.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials accepted and no OTP required; a session token was issued.
    Authenticated { user: User, token: String },
    /// Credentials accepted; an OTP was emailed and must be verified before a
    /// token is issued.
    OtpRequired { email: Email },
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
    mailer: &'a EmailService,
    otp_exempt: &'a [Email],
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// `otp_exempt` is the configured allowlist of accounts that skip OTP in
    /// addition to admins; every use of it is logged.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        tokens: &'a TokenService,
        mailer: &'a EmailService,
        otp_exempt: &'a [Email],
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            mailer,
            otp_exempt,
        }
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    /// Register a new user and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, phone, &password_hash, UserRole::User)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id, Utc::now())?;
        Ok((user, token))
    }

    /// Attempt a password login.
    ///
    /// On a wrong password the attempt counter is bumped and, past
    /// [`MAX_FAILED_ATTEMPTS`], the account locks for [`LOCKOUT_MINUTES`].
    /// On success the counter resets; admins and allowlisted accounts get a
    /// token immediately, everyone else gets an emailed OTP.
    ///
    /// # Errors
    ///
    /// See [`AuthError`] for the failure taxonomy; `Messaging` means the OTP
    /// email could not be sent and the stored OTP was rolled back.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = Email::parse(email)?;
        let (user, password_hash) = self
            .users
            .get_auth_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        let now = Utc::now();

        // A live lockout window rejects the attempt before the password is
        // even looked at.
        if is_locked(user.lock_until, now) {
            return Err(AuthError::AccountLocked);
        }

        if verify_password(password, &password_hash).is_err() {
            let attempts = user.login_attempts + 1;
            if let Some(lock_until) = lockout_after_failure(attempts, now) {
                self.users
                    .record_failed_login(user.id, attempts, Some(lock_until))
                    .await?;
                tracing::warn!(user = %user.email, "account locked after repeated login failures");
                return Err(AuthError::TooManyAttempts);
            }
            self.users
                .record_failed_login(user.id, attempts, None)
                .await?;
            return Err(AuthError::WrongPassword {
                remaining: remaining_attempts(attempts),
            });
        }

        if user.login_attempts > 0 || user.lock_until.is_some() {
            self.users.reset_login_attempts(user.id).await?;
        }

        if self.skips_otp(&user) {
            let token = self.tokens.issue(user.id, now)?;
            return Ok(LoginOutcome::Authenticated { user, token });
        }

        let code = email::generate_login_otp();
        let expires = now + TimeDelta::minutes(OTP_VALIDITY_MINUTES);
        self.users.set_otp(user.id, &code, expires).await?;

        if let Err(e) = self.mailer.send_login_otp(user.email.as_str(), &code).await {
            // Roll the half-written OTP back so a stale code can never verify.
            self.users.clear_otp(user.id).await?;
            tracing::error!(user = %user.email, error = %e, "OTP email dispatch failed");
            return Err(AuthError::Messaging(e));
        }

        Ok(LoginOutcome::OtpRequired { email: user.email })
    }

    /// Verify a pending OTP and issue a session token.
    ///
    /// The OTP is single-use: both fields are cleared on success.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `NoPendingOtp`, `InvalidOtp`, or `OtpExpired`.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let challenge = self.users.get_otp(user.id).await?;
        let now = Utc::now();
        validate_otp(challenge.as_ref(), otp, now)?;

        self.users.clear_otp(user.id).await?;
        let token = self.tokens.issue(user.id, now)?;
        Ok((user, token))
    }

    /// Login (or first-login registration) via a Google account.
    ///
    /// NOTE: like the system this replaces, the posted email is trusted
    /// without provider-side ID-token verification; a hardened deployment
    /// would verify the token before calling this.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    pub async fn google_login(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = match self.users.get_by_email(&email).await? {
            Some(user) => user,
            None => {
                // Accounts created this way get a random placeholder password
                // and are only usable via this flow until a password reset.
                let placeholder: String = rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(32)
                    .map(char::from)
                    .collect();
                let password_hash = hash_password(&placeholder)?;
                self.users
                    .create(
                        name.unwrap_or("User"),
                        &email,
                        None,
                        &password_hash,
                        UserRole::User,
                    )
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                        other => AuthError::Repository(other),
                    })?
            }
        };

        let token = self.tokens.issue(user.id, Utc::now())?;
        Ok((user, token))
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update name and/or email, refusing emails held by another account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the new email belongs to someone else.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AuthError> {
        let current = self.get_user(user_id).await?;

        let new_email = match email {
            Some(raw) => {
                let parsed = Email::parse(raw)?;
                if parsed != current.email
                    && self.users.get_by_email(&parsed).await?.is_some()
                {
                    return Err(AuthError::EmailInUse);
                }
                Some(parsed)
            }
            None => None,
        };

        self.users
            .update_profile(user_id, name, new_email.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailInUse,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change the password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordIncorrect` if the current password
    /// doesn't match, `AuthError::WeakPassword` if the new one is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.get_user(user_id).await?;
        let (_, password_hash) = self
            .users
            .get_auth_by_email(&user.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if verify_password(current_password, &password_hash).is_err() {
            return Err(AuthError::CurrentPasswordIncorrect);
        }

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &new_hash).await?;
        Ok(())
    }

    /// Whether this account bypasses the OTP step.
    fn skips_otp(&self, user: &User) -> bool {
        if user.role.is_admin() {
            tracing::debug!(user = %user.email, "admin login, skipping OTP");
            return true;
        }
        if self.otp_exempt.contains(&user.email) {
            tracing::warn!(user = %user.email, "OTP bypass via configured allowlist");
            return true;
        }
        false
    }
}

// =============================================================================
// Pure decision helpers
// =============================================================================

/// Whether a lockout window is currently active.
#[must_use]
pub fn is_locked(lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    lock_until.is_some_and(|until| until > now)
}

/// The lock expiry to store when the post-increment attempt count crosses the
/// limit, or `None` when the account survives this failure.
#[must_use]
pub fn lockout_after_failure(attempts: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (attempts > MAX_FAILED_ATTEMPTS).then(|| now + TimeDelta::minutes(LOCKOUT_MINUTES))
}

/// Attempts left after `attempts` failures, as reported to the client.
#[must_use]
pub const fn remaining_attempts(attempts: i32) -> i32 {
    MAX_FAILED_ATTEMPTS + 1 - attempts
}

/// Validate a submitted OTP against the stored challenge.
///
/// The mismatch check runs before the expiry check; clients rely on that
/// observable order.
///
/// # Errors
///
/// Returns `NoPendingOtp`, `InvalidOtp`, or `OtpExpired`.
pub fn validate_otp(
    challenge: Option<&OtpChallenge>,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let challenge = challenge.ok_or(AuthError::NoPendingOtp)?;

    if challenge.code != submitted {
        return Err(AuthError::InvalidOtp);
    }

    if challenge.expires < now {
        return Err(AuthError::OtpExpired);
    }

    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::CurrentPasswordIncorrect` on mismatch or an unparsable
/// stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AuthError::CurrentPasswordIncorrect)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::CurrentPasswordIncorrect)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn otp(code: &str, expires: DateTime<Utc>) -> OtpChallenge {
        OtpChallenge {
            code: code.to_owned(),
            expires,
        }
    }

    #[test]
    fn test_lockout_triggers_on_fourth_failure() {
        let now = Utc::now();
        assert!(lockout_after_failure(1, now).is_none());
        assert!(lockout_after_failure(2, now).is_none());
        assert!(lockout_after_failure(3, now).is_none());

        let lock = lockout_after_failure(4, now).unwrap();
        assert_eq!(lock, now + TimeDelta::minutes(LOCKOUT_MINUTES));
    }

    #[test]
    fn test_remaining_attempts_countdown() {
        assert_eq!(remaining_attempts(1), 3);
        assert_eq!(remaining_attempts(2), 2);
        assert_eq!(remaining_attempts(3), 1);
    }

    #[test]
    fn test_lock_window_is_exactly_fifteen_minutes() {
        let now = Utc::now();
        let lock = lockout_after_failure(4, now).unwrap();

        assert!(is_locked(Some(lock), now));
        assert!(is_locked(
            Some(lock),
            now + TimeDelta::minutes(LOCKOUT_MINUTES) - TimeDelta::seconds(1)
        ));
        assert!(!is_locked(
            Some(lock),
            now + TimeDelta::minutes(LOCKOUT_MINUTES)
        ));
        assert!(!is_locked(None, now));
    }

    #[test]
    fn test_validate_otp_no_pending() {
        assert!(matches!(
            validate_otp(None, "123456", Utc::now()),
            Err(AuthError::NoPendingOtp)
        ));
    }

    #[test]
    fn test_validate_otp_mismatch_reported_before_expiry() {
        let now = Utc::now();
        // Expired AND wrong: the mismatch wins.
        let stale = otp("111111", now - TimeDelta::minutes(1));
        assert!(matches!(
            validate_otp(Some(&stale), "222222", now),
            Err(AuthError::InvalidOtp)
        ));
    }

    #[test]
    fn test_validate_otp_expired() {
        let now = Utc::now();
        let stale = otp("123456", now - TimeDelta::seconds(1));
        assert!(matches!(
            validate_otp(Some(&stale), "123456", now),
            Err(AuthError::OtpExpired)
        ));
    }

    #[test]
    fn test_validate_otp_accepts_within_window() {
        let now = Utc::now();
        let live = otp("123456", now + TimeDelta::minutes(OTP_VALIDITY_MINUTES));
        assert!(validate_otp(Some(&live), "123456", now).is_ok());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pw123456").unwrap();
        assert!(verify_password("pw123456", &hash).is_ok());
        assert!(verify_password("wrong-password", &hash).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
