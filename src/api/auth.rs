use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{AccountResponse, ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::Role;
use crate::models::account::Account;
use crate::services::AuthSession;
use crate::services::auth_service::{
    Credentials, PasswordChange, ProfileUpdate, Registration, ensure_role,
};

/// The verified account behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to an active account and makes
/// it available to handlers as [`CurrentAccount`].
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let account = state.auth_service().current_account(token).await?;

    tracing::Span::current().record("account_id", account.id.value());
    request.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(request).await)
}

/// Must run after [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let account = request
        .extensions()
        .get::<CurrentAccount>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    ensure_role(&account.0, Role::Admin)?;

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Registration>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// POST /auth/login
/// Accepts either the email or the username as `identifier`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let session = state.auth_service().authenticate(&payload).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// GET /auth/me
pub async fn get_current_account(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = state.auth_service().profile(account.id).await?;
    Ok(Json(ApiResponse::success(AccountResponse { account })))
}

/// PUT /auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = state
        .auth_service()
        .update_profile(account.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(AccountResponse { account })))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(account.id, payload)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
