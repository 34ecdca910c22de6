use serde::Serialize;

use crate::models::account::PublicAccount;
use crate::models::cart::CartItem;
use crate::services::validation::FieldError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn invalid(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account: PublicAccount,
}

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<PublicAccount>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
