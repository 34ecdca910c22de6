//! Domain service for the per-account server-side cart.

use sea_orm::DbErr;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::AccountId;
use crate::models::cart::{CartItem, NewCartItem};
use crate::services::validation::FieldError;

/// Errors specific to cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Item not found in cart")]
    ItemNotFound,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbErr> for CartError {
    fn from(err: DbErr) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<anyhow::Error> for CartError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<DbErr>().is_some() {
            return Self::StoreUnavailable(format!("{err:#}"));
        }
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i32,
}

#[async_trait::async_trait]
pub trait CartService: Send + Sync {
    async fn list(&self, account_id: AccountId) -> Result<Vec<CartItem>, CartError>;

    /// Adds the item, merging into an existing line with the same product
    /// and category. Returns the whole cart.
    async fn add(&self, account_id: AccountId, item: NewCartItem)
    -> Result<Vec<CartItem>, CartError>;

    /// Sets a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] when the account has no such line.
    async fn set_quantity(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
        quantity: i32,
    ) -> Result<Vec<CartItem>, CartError>;

    /// Removing a line that is not there is not an error.
    async fn remove(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
    ) -> Result<Vec<CartItem>, CartError>;

    async fn clear(&self, account_id: AccountId) -> Result<(), CartError>;
}
