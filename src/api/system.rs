//! Liveness and readiness.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, HealthResponse};

/// `GET /api/health`
///
/// Pings the store; a store that does not answer makes the service
/// unavailable.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("{e:#}")))?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}
