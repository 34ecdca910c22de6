pub mod account;
pub mod cart;
