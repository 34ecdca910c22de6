use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::debug;

use crate::domain::AccountId;
use crate::entities::{cart_items, prelude::CartItems};
use crate::models::account::format_timestamp;
use crate::models::cart::{CartItem, DEFAULT_ITEM_IMAGE, MAX_QUANTITY, NewCartItem};

/// Repository for per-account cart lines.
pub struct CartRepository {
    conn: DatabaseConnection,
}

impl CartRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, account_id: AccountId) -> Result<Vec<CartItem>> {
        let rows = CartItems::find()
            .filter(cart_items::Column::AccountId.eq(account_id.value()))
            .order_by_asc(cart_items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list cart items")?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Inserts the line, or adds its quantity onto the existing line for the
    /// same product and category. The merged quantity is capped at
    /// `MAX_QUANTITY`.
    pub async fn add(
        &self,
        account_id: AccountId,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = format_timestamp(now);

        let active = cart_items::ActiveModel {
            account_id: Set(account_id.value()),
            product_id: Set(item.product_id),
            category: Set(item.category),
            name: Set(item.name),
            price: Set(item.price),
            quantity: Set(item.quantity),
            image: Set(item
                .image
                .unwrap_or_else(|| DEFAULT_ITEM_IMAGE.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let on_conflict = OnConflict::columns([
            cart_items::Column::AccountId,
            cart_items::Column::ProductId,
            cart_items::Column::Category,
        ])
        .value(
            cart_items::Column::Quantity,
            Expr::cust_with_values(
                r#"MIN("cart_items"."quantity" + excluded.quantity, ?)"#,
                [MAX_QUANTITY],
            ),
        )
        .update_columns([
            cart_items::Column::Name,
            cart_items::Column::Price,
            cart_items::Column::Image,
            cart_items::Column::UpdatedAt,
        ])
        .to_owned();

        CartItems::insert(active)
            .on_conflict(on_conflict)
            .exec(&self.conn)
            .await
            .context("Failed to add cart item")?;

        debug!(account_id = %account_id, "Cart item added");
        Ok(())
    }

    /// Returns false when the account has no such line.
    pub async fn set_quantity(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = CartItems::update_many()
            .col_expr(cart_items::Column::Quantity, Expr::value(quantity))
            .col_expr(cart_items::Column::UpdatedAt, Expr::value(format_timestamp(now)))
            .filter(cart_items::Column::AccountId.eq(account_id.value()))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .filter(cart_items::Column::Category.eq(category))
            .exec(&self.conn)
            .await
            .context("Failed to update cart item quantity")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn remove(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
    ) -> Result<bool> {
        let result = CartItems::delete_many()
            .filter(cart_items::Column::AccountId.eq(account_id.value()))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .filter(cart_items::Column::Category.eq(category))
            .exec(&self.conn)
            .await
            .context("Failed to remove cart item")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear(&self, account_id: AccountId) -> Result<u64> {
        let result = CartItems::delete_many()
            .filter(cart_items::Column::AccountId.eq(account_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to clear cart")?;

        Ok(result.rows_affected)
    }
}
