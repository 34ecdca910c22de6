pub mod lockout;
pub mod password;
pub mod token;
pub mod validation;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession};
pub use auth_service_impl::SeaOrmAuthService;

pub mod cart_service;
pub mod cart_service_impl;
pub use cart_service::{CartError, CartService};
pub use cart_service_impl::SeaOrmCartService;
