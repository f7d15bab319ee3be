//! Cart route handlers.
//!
//! The cart is persisted per user; checkout consumes it. Mutating handlers
//! return the refreshed cart so the client doesn't need a follow-up fetch.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use pitchside_core::ProductId;

use crate::db::users::UserRepository;
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::CartEntry;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
}

/// Remove-item query parameters.
#[derive(Debug, Deserialize)]
pub struct RemoveCartQuery {
    #[serde(default)]
    pub size: Option<String>,
}

/// `GET /api/cart`
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn show(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CartEntry>>> {
    let cart = UserRepository::new(state.pool()).list_cart(user.id).await?;
    Ok(Json(cart))
}

/// `POST /api/cart`
///
/// # Errors
///
/// Returns 400 for a non-positive quantity, 404 for an unknown or inactive
/// product.
pub async fn add(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<Vec<CartEntry>>)> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.is_orderable() {
        return Err(AppError::BadRequest(format!(
            "Product {} is not available",
            product.name
        )));
    }

    let users = UserRepository::new(state.pool());
    users
        .add_cart_item(user.id, body.product_id, body.quantity, body.size.as_deref())
        .await?;

    let cart = users.list_cart(user.id).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// `PUT /api/cart/{product_id}`
///
/// # Errors
///
/// Returns 400 for a non-positive quantity, 404 when the item isn't in the
/// cart.
pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateCartRequest>,
) -> Result<Json<Vec<CartEntry>>> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let users = UserRepository::new(state.pool());
    users
        .set_cart_quantity(user.id, product_id, body.quantity, body.size.as_deref())
        .await
        .map_err(not_in_cart)?;

    let cart = users.list_cart(user.id).await?;
    Ok(Json(cart))
}

/// `DELETE /api/cart/{product_id}`
///
/// # Errors
///
/// Returns 404 when the item isn't in the cart.
pub async fn remove(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(query): Query<RemoveCartQuery>,
) -> Result<Json<Vec<CartEntry>>> {
    let users = UserRepository::new(state.pool());
    users
        .remove_cart_item(user.id, product_id, query.size.as_deref())
        .await
        .map_err(not_in_cart)?;

    let cart = users.list_cart(user.id).await?;
    Ok(Json(cart))
}

fn not_in_cart(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Item not in cart".to_string()),
        other => AppError::Database(other),
    }
}
