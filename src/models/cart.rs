use serde::{Deserialize, Serialize};

use crate::entities::cart_items;

pub const DEFAULT_ITEM_IMAGE: &str = "fas fa-box";

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: i32 = 999;

/// One line of an account's server-side cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub category: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub image: String,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            product_id: model.product_id,
            category: model.category,
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            image: model.image,
        }
    }
}

/// Item as submitted for adding to the cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: String,
    pub category: String,
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub image: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}
