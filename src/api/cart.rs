use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_cart_key;
use super::{ApiError, ApiResponse, AppState, CartResponse, auth::CurrentAccount};
use crate::models::cart::NewCartItem;
use crate::services::cart_service::QuantityUpdate;

/// GET /cart
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    let cart = state.cart_service().list(account.id).await?;
    Ok(Json(ApiResponse::success(CartResponse { cart })))
}

/// POST /cart
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(item): Json<NewCartItem>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    let cart = state.cart_service().add(account.id, item).await?;
    Ok(Json(ApiResponse::success(CartResponse { cart })))
}

/// PUT /cart/{product_id}/{category}
pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path((product_id, category)): Path<(String, String)>,
    Json(payload): Json<QuantityUpdate>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    let (product_id, category) = validate_cart_key(&product_id, &category)?;

    let cart = state
        .cart_service()
        .set_quantity(account.id, product_id, category, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(CartResponse { cart })))
}

/// DELETE /cart/{product_id}/{category}
pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path((product_id, category)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    let (product_id, category) = validate_cart_key(&product_id, &category)?;

    let cart = state
        .cart_service()
        .remove(account.id, product_id, category)
        .await?;
    Ok(Json(ApiResponse::success(CartResponse { cart })))
}

/// DELETE /cart
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    state.cart_service().clear(account.id).await?;
    Ok(Json(ApiResponse::success(CartResponse { cart: Vec::new() })))
}
