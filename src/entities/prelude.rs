pub use super::accounts::Entity as Accounts;
pub use super::cart_items::Entity as CartItems;
