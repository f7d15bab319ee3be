//! Integration tests for the login workflow decision logic.
//!
//! Covers the failed-attempt/lockout arithmetic, the OTP validity rules, and
//! the bearer-token codec - the pieces of the auth state machine that don't
//! need a database.

use chrono::{TimeDelta, Utc};
use secrecy::SecretString;

use pitchside_core::UserId;

use pitchside_api::models::OtpChallenge;
use pitchside_api::services::auth::{
    AuthError, LOCKOUT_MINUTES, MAX_FAILED_ATTEMPTS, OTP_VALIDITY_MINUTES, is_locked,
    lockout_after_failure, remaining_attempts, validate_otp,
};
use pitchside_api::services::token::{TOKEN_TTL_DAYS, TokenError, TokenService};

// =============================================================================
// Lockout Window
// =============================================================================

/// Walk the documented end-to-end scenario: four consecutive wrong passwords
/// lock the account; the lock holds even against a correct password until the
/// window passes.
#[test]
fn test_four_wrong_passwords_lock_for_fifteen_minutes() {
    let now = Utc::now();

    // Failures 1-3 only count down the remaining attempts
    let mut lock = None;
    for attempts in 1..=MAX_FAILED_ATTEMPTS {
        lock = lockout_after_failure(attempts, now);
        assert!(lock.is_none(), "attempt {attempts} must not lock");
        assert_eq!(remaining_attempts(attempts), 4 - attempts);
    }
    assert!(lock.is_none());

    // The 4th failure locks
    let lock = lockout_after_failure(MAX_FAILED_ATTEMPTS + 1, now).expect("4th failure locks");
    assert_eq!(lock, now + TimeDelta::minutes(LOCKOUT_MINUTES));

    // The lock gates every attempt inside the window, password correctness
    // never enters into it (the check runs before password comparison)
    assert!(is_locked(Some(lock), now));
    assert!(is_locked(Some(lock), now + TimeDelta::minutes(14)));
    assert!(!is_locked(Some(lock), now + TimeDelta::minutes(15)));
}

#[test]
fn test_counter_reset_restores_full_allowance() {
    let now = Utc::now();

    // Two failures, then a success resets the counter to zero; the next
    // failure is counted as the first again.
    assert!(lockout_after_failure(2, now).is_none());
    assert_eq!(remaining_attempts(1), 3);
}

// =============================================================================
// OTP Validity
// =============================================================================

fn challenge(code: &str, issued_minutes_ago: i64) -> OtpChallenge {
    OtpChallenge {
        code: code.to_owned(),
        expires: Utc::now() + TimeDelta::minutes(OTP_VALIDITY_MINUTES - issued_minutes_ago),
    }
}

#[test]
fn test_otp_verifies_only_when_stored_matching_and_unexpired() {
    let now = Utc::now();

    // No pending OTP
    assert!(matches!(
        validate_otp(None, "123456", now),
        Err(AuthError::NoPendingOtp)
    ));

    // Wrong code
    let live = challenge("123456", 0);
    assert!(matches!(
        validate_otp(Some(&live), "654321", now),
        Err(AuthError::InvalidOtp)
    ));

    // Expired (issued more than 10 minutes ago)
    let stale = challenge("123456", OTP_VALIDITY_MINUTES + 1);
    assert!(matches!(
        validate_otp(Some(&stale), "123456", now),
        Err(AuthError::OtpExpired)
    ));

    // Stored, matching, unexpired
    assert!(validate_otp(Some(&live), "123456", now).is_ok());
}

#[test]
fn test_otp_boundary_at_ten_minutes() {
    let issued = Utc::now();
    let otp = OtpChallenge {
        code: "123456".to_owned(),
        expires: issued + TimeDelta::minutes(OTP_VALIDITY_MINUTES),
    };

    let just_inside = issued + TimeDelta::minutes(OTP_VALIDITY_MINUTES) - TimeDelta::seconds(1);
    assert!(validate_otp(Some(&otp), "123456", just_inside).is_ok());

    let just_outside = issued + TimeDelta::minutes(OTP_VALIDITY_MINUTES) + TimeDelta::seconds(1);
    assert!(matches!(
        validate_otp(Some(&otp), "123456", just_outside),
        Err(AuthError::OtpExpired)
    ));
}

// =============================================================================
// Bearer Token Codec
// =============================================================================

fn token_service() -> TokenService {
    TokenService::new(SecretString::from("kM9#vQ2$xT7&wZ4!nB5@pL8*rJ1^cF6e"))
}

#[test]
fn test_token_roundtrip_carries_user_id() {
    let tokens = token_service();
    let now = Utc::now();

    let token = tokens.issue(UserId::new(7), now).expect("issues");
    assert_eq!(tokens.verify(&token, now).expect("verifies"), UserId::new(7));
}

#[test]
fn test_token_expires_after_seven_days() {
    let tokens = token_service();
    let now = Utc::now();
    let token = tokens.issue(UserId::new(7), now).expect("issues");

    assert!(tokens
        .verify(&token, now + TimeDelta::days(TOKEN_TTL_DAYS) - TimeDelta::hours(1))
        .is_ok());
    assert!(matches!(
        tokens.verify(&token, now + TimeDelta::days(TOKEN_TTL_DAYS) + TimeDelta::hours(1)),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_token_rejects_tampering_and_foreign_keys() {
    let tokens = token_service();
    let now = Utc::now();
    let token = tokens.issue(UserId::new(7), now).expect("issues");

    // Flip a character in the payload
    let mut tampered: Vec<char> = token.chars().collect();
    tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    assert!(tokens.verify(&tampered, now).is_err());

    // A token signed under a different key never verifies
    let other = TokenService::new(SecretString::from("another 32+ character signing key!!"));
    assert!(matches!(
        other.verify(&token, now),
        Err(TokenError::InvalidSignature)
    ));
}
