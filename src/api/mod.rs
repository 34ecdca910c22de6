use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod cart;
mod error;
mod observability;
mod system;
mod types;
mod validation;

pub use auth::CurrentAccount;
pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AuthService, CartService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn cart_service(&self) -> &Arc<dyn CartService> {
        &self.shared.cart_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new().nest("/api", api_router).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(
                observability::security_headers_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer.allow_methods(Any).allow_headers(Any)),
    )
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/admin/accounts", get(admin::list_accounts))
        .route(
            "/admin/accounts/{id}/active",
            put(admin::set_account_active),
        )
        .route_layer(middleware::from_fn(auth::admin_middleware));

    Router::new()
        .route("/auth/me", get(auth::get_current_account))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
        .route(
            "/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route(
            "/cart/{product_id}/{category}",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
