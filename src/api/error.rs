use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::validation::FieldError;
use crate::services::{AuthError, CartError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    /// Field-level failures, rendered in the `errors` array.
    InvalidFields(Vec<FieldError>),

    Conflict(String),

    Unauthorized(String),

    /// Failed sign-in; kept apart from token failures for the request log.
    InvalidCredentials(String),

    Forbidden(String),

    Locked(String),

    ServiceUnavailable(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::InvalidFields(errors) => write!(f, "Validation error: {} field(s)", errors.len()),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Unauthorized(msg) | Self::InvalidCredentials(msg) => {
                write!(f, "Unauthorized: {msg}")
            }
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::Locked(msg) => write!(f, "Locked: {msg}"),
            Self::ServiceUnavailable(msg) => write!(f, "Service unavailable: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Response extension naming why a request failed; read by the request logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) | Self::InvalidFields(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::Forbidden(_) => "forbidden",
            Self::Locked(_) => "locked",
            Self::ServiceUnavailable(_) => "store_unavailable",
            Self::InternalError(_) => "internal",
        }
    }

    fn render(self) -> Response {
        let (status, error_message) = match self {
            Self::InvalidFields(errors) => {
                let body = ApiResponse::<()>::invalid("Validation failed", errors);
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Unauthorized(msg) | Self::InvalidCredentials(msg) => {
                (StatusCode::UNAUTHORIZED, msg)
            }
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Locked(msg) => (StatusCode::LOCKED, msg),
            Self::ServiceUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = ErrorKind(self.kind());
        let mut response = self.render();
        response.extensions_mut().insert(kind);
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::Validation(errors) => Self::InvalidFields(errors),
            AuthError::DuplicateIdentifier => Self::Conflict(message),
            AuthError::InvalidCredentials => Self::InvalidCredentials(message),
            AuthError::AccountLocked => Self::Locked(message),
            AuthError::Unauthorized => Self::Unauthorized("Invalid or expired token".to_string()),
            AuthError::Forbidden => Self::Forbidden("Admin access required".to_string()),
            AuthError::AccountNotFound => Self::NotFound(message),
            AuthError::StoreUnavailable(msg) => Self::ServiceUnavailable(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        match err {
            CartError::Validation(errors) => Self::InvalidFields(errors),
            CartError::ItemNotFound => Self::NotFound(message),
            CartError::StoreUnavailable(msg) => Self::ServiceUnavailable(msg),
            CartError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}
