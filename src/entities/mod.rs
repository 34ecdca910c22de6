pub mod prelude;

pub mod accounts;
pub mod cart_items;
