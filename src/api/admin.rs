use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_account_id;
use super::{AccountResponse, AccountsResponse, ApiError, ApiResponse, AppState};
use crate::domain::AccountId;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// GET /admin/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AccountsResponse>>, ApiError> {
    let accounts = state.auth_service().list_accounts().await?;
    Ok(Json(ApiResponse::success(AccountsResponse { accounts })))
}

/// PUT /admin/accounts/{id}/active
pub async fn set_account_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let id = AccountId::new(validate_account_id(id)?);

    let account = state
        .auth_service()
        .set_account_active(id, payload.active)
        .await?;
    Ok(Json(ApiResponse::success(AccountResponse { account })))
}
