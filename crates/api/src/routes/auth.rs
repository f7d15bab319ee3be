//! Authentication and account route handlers.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use pitchside_core::{AddressId, Email};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Address, UserProfile};
use crate::services::auth::{AuthService, LoginOutcome};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OTP verification request body.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Google sign-in request body.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// New address request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddressRequest {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Token + user, returned by every authenticating endpoint.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Login response: either a token or an OTP challenge.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginReply {
    Authenticated(AuthResponse),
    OtpRequired {
        #[serde(rename = "otpRequired")]
        otp_required: bool,
        message: String,
        email: Email,
    },
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: UserProfile,
}

// =============================================================================
// Handlers
// =============================================================================

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(
        state.pool(),
        state.tokens(),
        state.mailer(),
        &state.config().otp_exempt_emails,
    )
}

/// `POST /api/auth/register`
///
/// # Errors
///
/// Returns 400 for invalid email/password or an already-registered email.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = auth_service(&state)
        .register(&body.name, &body.email, &body.password, body.phone.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}

/// `POST /api/auth/login`
///
/// # Errors
///
/// Returns 400 for wrong credentials, 403 when the account is locked, 500
/// when the OTP email cannot be sent.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginReply>> {
    let outcome = auth_service(&state).login(&body.email, &body.password).await?;

    let reply = match outcome {
        LoginOutcome::Authenticated { user, token } => LoginReply::Authenticated(AuthResponse {
            token,
            user: user.profile(),
        }),
        LoginOutcome::OtpRequired { email } => LoginReply::OtpRequired {
            otp_required: true,
            message: "OTP sent to your email".to_string(),
            email,
        },
    };
    Ok(Json(reply))
}

/// `POST /api/auth/verify-otp`
///
/// # Errors
///
/// Returns 400 for a missing/invalid/expired OTP, 404 for an unknown user.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, token) = auth_service(&state)
        .verify_otp(&body.email, &body.otp)
        .await?;

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// `POST /api/auth/google`
///
/// # Errors
///
/// Returns 400 when no email is supplied.
pub async fn google(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = body
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    let (user, token) = auth_service(&state)
        .google_login(email, body.name.as_deref())
        .await?;

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// `GET /api/auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: user.profile(),
    })
}

/// `PUT /api/auth/update-profile`
///
/// # Errors
///
/// Returns 400 when the new email is already in use.
pub async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdatedResponse>> {
    let updated = auth_service(&state)
        .update_profile(user.id, body.name.as_deref(), body.email.as_deref())
        .await?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully".to_string(),
        user: updated.profile(),
    }))
}

/// `PUT /api/auth/change-password`
///
/// # Errors
///
/// Returns 400 when the current password is wrong or the new one is too weak.
pub async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state)
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

// =============================================================================
// Addresses
// =============================================================================

/// `GET /api/auth/addresses`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_addresses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>> {
    let addresses = UserRepository::new(state.pool())
        .list_addresses(user.id)
        .await?;
    Ok(Json(addresses))
}

/// `POST /api/auth/addresses`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn add_address(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<NewAddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = UserRepository::new(state.pool())
        .add_address(
            user.id,
            &body.full_name,
            &body.phone,
            &body.address,
            &body.city,
            body.postal_code.as_deref(),
            body.is_default,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// `DELETE /api/auth/addresses/{id}`
///
/// # Errors
///
/// Returns 404 when the address doesn't exist or belongs to someone else.
pub async fn delete_address(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(address_id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    UserRepository::new(state.pool())
        .delete_address(user.id, address_id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Address not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(MessageResponse {
        message: "Address deleted successfully".to_string(),
    }))
}
