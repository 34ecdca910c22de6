//! `SeaORM` implementation of the `CartService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::AccountId;
use crate::models::cart::{CartItem, MAX_QUANTITY, NewCartItem};
use crate::services::cart_service::{CartError, CartService};
use crate::services::validation::{self, CART_KEY_MAX, CART_NAME_MAX, FieldError};

pub struct SeaOrmCartService {
    store: Store,
}

impl SeaOrmCartService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn validate_item(item: NewCartItem) -> Result<NewCartItem, CartError> {
    let mut errors = Vec::new();
    validation::collect(
        validation::bounded("productId", &item.product_id, CART_KEY_MAX),
        &mut errors,
    );
    validation::collect(
        validation::bounded("category", &item.category, CART_KEY_MAX),
        &mut errors,
    );
    validation::collect(
        validation::bounded("name", &item.name, CART_NAME_MAX),
        &mut errors,
    );
    let image = validation::collect(
        validation::profile_text("image", item.image.as_deref()),
        &mut errors,
    );

    if !item.price.is_finite() || item.price < 0.0 {
        errors.push(FieldError::new("price", "Price must be a non-negative number"));
    }
    if !(1..=MAX_QUANTITY).contains(&item.quantity) {
        errors.push(FieldError::new(
            "quantity",
            format!("Quantity must be between 1 and {MAX_QUANTITY}"),
        ));
    }

    if !errors.is_empty() {
        return Err(CartError::Validation(errors));
    }

    Ok(NewCartItem {
        product_id: item.product_id.trim().to_string(),
        category: item.category.trim().to_string(),
        name: item.name.trim().to_string(),
        image: image.flatten().filter(|i| !i.is_empty()),
        ..item
    })
}

#[async_trait]
impl CartService for SeaOrmCartService {
    async fn list(&self, account_id: AccountId) -> Result<Vec<CartItem>, CartError> {
        Ok(self.store.list_cart(account_id).await?)
    }

    async fn add(
        &self,
        account_id: AccountId,
        item: NewCartItem,
    ) -> Result<Vec<CartItem>, CartError> {
        let item = validate_item(item)?;
        debug!(
            account_id = %account_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            "Adding to cart"
        );

        self.store.add_cart_item(account_id, item, Utc::now()).await?;
        self.list(account_id).await
    }

    async fn set_quantity(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
        quantity: i32,
    ) -> Result<Vec<CartItem>, CartError> {
        if quantity > MAX_QUANTITY {
            return Err(CartError::Validation(vec![FieldError::new(
                "quantity",
                format!("Quantity cannot exceed {MAX_QUANTITY}"),
            )]));
        }

        let found = if quantity <= 0 {
            self.store
                .remove_cart_item(account_id, product_id, category)
                .await?
        } else {
            self.store
                .set_cart_quantity(account_id, product_id, category, quantity, Utc::now())
                .await?
        };

        if !found {
            return Err(CartError::ItemNotFound);
        }

        self.list(account_id).await
    }

    async fn remove(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
    ) -> Result<Vec<CartItem>, CartError> {
        self.store
            .remove_cart_item(account_id, product_id, category)
            .await?;
        self.list(account_id).await
    }

    async fn clear(&self, account_id: AccountId) -> Result<(), CartError> {
        let removed = self.store.clear_cart(account_id).await?;
        info!(account_id = %account_id, removed, "Cart cleared");
        Ok(())
    }
}
