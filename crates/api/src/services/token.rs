//! Signed bearer tokens.
//!
//! Tokens are an HMAC-SHA256-signed claims blob: `base64url(claims JSON)`
//! followed by `.` and `base64url(signature)`. They carry the user id and a
//! fixed 7-day expiry; protected routes verify the signature and expiry and
//! then load the user from the database.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use pitchside_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Token validity window.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Errors that can occur when issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token is not two base64url sections separated by a dot, or the claims
    /// are not valid JSON.
    #[error("malformed token")]
    Malformed,

    /// Signature does not match the claims.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's expiry is in the past.
    #[error("token expired")]
    Expired,

    /// Failed to serialize claims.
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Claims embedded in a token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject - the user id.
    sub: i32,
    /// Issued at (unix timestamp).
    iat: i64,
    /// Expiry (unix timestamp).
    exp: i64,
}

/// Issues and verifies signed session tokens.
pub struct TokenService {
    secret: SecretString,
}

impl TokenService {
    /// Create a token service from the signing secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Issue a token for a user, valid for [`TOKEN_TTL_DAYS`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if the claims cannot be serialized.
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.as_i32(),
            iat: now.timestamp(),
            exp: (now + TimeDelta::days(TOKEN_TTL_DAYS)).timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// The signature is checked before the claims are even parsed, and the
    /// comparison is constant-time.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed`, `TokenError::InvalidSignature`, or
    /// `TokenError::Expired`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(UserId::new(claims.sub))
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so construction cannot fail.
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length")
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(SecretString::from("kM9#vQ2$xT7&wZ4!nB5@pL8*rJ1^cF6e"))
    }

    #[test]
    fn test_roundtrip() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue(UserId::new(42), now).unwrap();
        let verified = tokens.verify(&token, now).unwrap();
        assert_eq!(verified, UserId::new(42));
    }

    #[test]
    fn test_valid_for_seven_days() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue(UserId::new(1), now).unwrap();

        let just_before = now + TimeDelta::days(TOKEN_TTL_DAYS) - TimeDelta::seconds(1);
        assert!(tokens.verify(&token, just_before).is_ok());

        let just_after = now + TimeDelta::days(TOKEN_TTL_DAYS) + TimeDelta::seconds(1);
        assert!(matches!(
            tokens.verify(&token, just_after),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue(UserId::new(1), now).unwrap();

        // Swap in claims for a different user while keeping the signature
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: 2,
                iat: now.timestamp(),
                exp: (now + TimeDelta::days(TOKEN_TTL_DAYS)).timestamp(),
            })
            .unwrap(),
        );
        let forged = format!("{forged_claims}.{signature}");

        assert!(matches!(
            tokens.verify(&forged, now),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let now = Utc::now();
        let token = service().issue(UserId::new(1), now).unwrap();

        let other = TokenService::new(SecretString::from("a different signing key entirely!!"));
        assert!(matches!(
            other.verify(&token, now),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service();
        let now = Utc::now();
        assert!(matches!(
            tokens.verify("not-a-token", now),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            tokens.verify("still.not.a.token", now),
            Err(TokenError::Malformed) | Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(tokens.verify("", now), Err(TokenError::Malformed)));
    }
}
