//! Authentication middleware and extractors.
//!
//! Protected routes authenticate with a signed bearer token; the extractor
//! verifies the signature and expiry, then loads the account so handlers see
//! the current role and profile, not a stale claim.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use crate::db::users::UserRepository;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub User);

/// Extractor that additionally requires the admin role.
pub struct RequireAdmin(pub User);

/// Error returned when authentication fails.
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Token failed verification, or its user no longer exists.
    InvalidToken,
    /// Authenticated but not an admin.
    NotAdmin,
    /// Database failure while loading the account.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "No token, authorization denied",
            ),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is not valid"),
            Self::NotAdmin => (StatusCode::FORBIDDEN, "Access denied. Admin only."),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthRejection::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::MissingToken)?;

        let user_id = state
            .tokens()
            .verify(token, Utc::now())
            .map_err(|_| AuthRejection::InvalidToken)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to load user for bearer token");
                AuthRejection::Internal
            })?
            .ok_or(AuthRejection::InvalidToken)?;

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AuthRejection::NotAdmin);
        }

        Ok(Self(user))
    }
}
