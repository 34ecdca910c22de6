//! Domain service for registration, login and account management.
//!
//! Owns the lockout state machine: every failed password check goes through
//! [`AuthService::record_outcome`], and successful logins reset the counters
//! on their own path.

use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AccountId, Role};
use crate::models::account::{Account, PublicAccount};
use crate::services::validation::FieldError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("An account with this email or username already exists")]
    DuplicateIdentifier,

    /// Same error for an unknown identifier and a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is temporarily locked due to too many failed login attempts")]
    AccountLocked,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<DbErr> for AuthError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateIdentifier,
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

/// Repository failures arrive as `anyhow` errors wrapping a `DbErr`; anything
/// else is an internal fault.
impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<DbErr>() {
            return match db_err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateIdentifier,
                _ => Self::StoreUnavailable(format!("{err:#}")),
            };
        }
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Email or username.
    #[serde(alias = "username", alias = "email", default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Partial contact-details change. An empty string clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub avatar: Option<String>,
}

/// Partial profile update. Absent fields keep their stored value; the
/// username cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub profile: Option<ProfilePatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Result of register and login: the public profile plus a bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub account: PublicAccount,
    pub token: String,
}

/// Fails with [`AuthError::Forbidden`] unless the account holds `role`.
pub fn ensure_role(account: &Account, role: Role) -> Result<(), AuthError> {
    if account.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] listing every bad field, or
    /// [`AuthError::DuplicateIdentifier`] when the email or username is taken.
    async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError>;

    /// Verifies credentials, applying the lockout rules.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown identifier or a wrong
    /// password, [`AuthError::AccountLocked`] while a lock is active or when
    /// this attempt triggered one.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    /// Applies the outcome of a password check to the stored counters.
    /// A successful outcome is a no-op; the login path resets on its own.
    async fn record_outcome(&self, account: &Account, failed: bool) -> Result<(), AuthError>;

    /// Resolves a bearer token to an active account.
    async fn current_account(&self, token: &str) -> Result<Account, AuthError>;

    /// Public profile including the account's cart.
    async fn profile(&self, id: AccountId) -> Result<PublicAccount, AuthError>;

    async fn update_profile(
        &self,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<PublicAccount, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong or
    /// the new one is unacceptable.
    async fn change_password(&self, id: AccountId, change: PasswordChange)
    -> Result<(), AuthError>;

    async fn list_accounts(&self) -> Result<Vec<PublicAccount>, AuthError>;

    async fn set_account_active(
        &self,
        id: AccountId,
        active: bool,
    ) -> Result<PublicAccount, AuthError>;

    /// Grants the admin role to the account matching `identifier`.
    async fn promote(&self, identifier: &str) -> Result<PublicAccount, AuthError>;
}
