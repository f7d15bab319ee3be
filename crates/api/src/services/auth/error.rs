//! Authentication error types.
//!
//! Display strings double as the client-facing `message` field, so several
//! variants carry the exact wording the single-page client matches on.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError as EmailSendError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] pitchside_core::EmailError),

    /// No account for the given email.
    ///
    /// Distinguishing "email wrong" from "password wrong" is a deliberate
    /// information-leak tradeoff; the client surfaces the distinct wording.
    #[error("Email is wrong")]
    UnknownEmail,

    /// Wrong password; reports how many attempts remain before lockout.
    #[error("Password is wrong. You have {remaining} attempts remaining.")]
    WrongPassword { remaining: i32 },

    /// The account is inside an active lockout window.
    #[error("Account is locked temporarily. Please try again after 15 minutes.")]
    AccountLocked,

    /// This failed attempt exhausted the allowance and locked the account.
    #[error("Account locked due to too many failed attempts. Please try again after 15 minutes.")]
    TooManyAttempts,

    /// Registration against an existing email.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// OTP verification attempted with no pending OTP.
    #[error("No OTP request found")]
    NoPendingOtp,

    /// Submitted OTP does not match the stored one.
    #[error("Invalid OTP")]
    InvalidOtp,

    /// The stored OTP's validity window has passed.
    #[error("OTP has expired")]
    OtpExpired,

    /// Password change with a wrong current password.
    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    /// Profile update to an email someone else holds.
    #[error("Email already in use")]
    EmailInUse,

    /// OTP email dispatch failed (the pending OTP has been rolled back).
    #[error("Email could not be sent. Check server logs.")]
    Messaging(#[source] EmailSendError),

    /// Token issuing failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
