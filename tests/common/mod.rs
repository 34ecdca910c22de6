#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use storefront::config::Config;
use storefront::db::Store;
use storefront::services::auth_service::{Credentials, Registration};
use storefront::state::SharedState;

/// Fresh file-backed database per test; the pool's connections share it.
pub fn temp_db_url() -> String {
    let path = std::env::temp_dir().join(format!("storefront-test-{}.db", uuid::Uuid::new_v4()));
    format!("sqlite:{}", path.display())
}

/// Defaults with cheap hashing and a fixed signing secret.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = temp_db_url();
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;
    config.token.secret = "integration-test-secret-0123456789abcdef".to_string();
    config
}

pub async fn test_state() -> SharedState {
    test_state_with(test_config()).await
}

pub async fn test_state_with(config: Config) -> SharedState {
    let store = Store::with_pool_options(&config.general.database_path, 8, 1)
        .await
        .expect("Failed to open test store");
    SharedState::with_store(config, store).expect("Failed to build state")
}

pub async fn spawn_app() -> (Router, Arc<SharedState>) {
    let shared = Arc::new(test_state().await);
    let state = storefront::api::create_app_state(shared.clone(), None);
    (storefront::api::router(state).await, shared)
}

pub fn registration(full_name: &str, email: &str, username: &str, password: &str) -> Registration {
    Registration {
        full_name: full_name.to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    }
}

pub fn jane() -> Registration {
    registration("Jane Doe", "jane@x.com", "janedoe", "secret1")
}

pub fn credentials(identifier: &str, password: &str) -> Credentials {
    Credentials {
        identifier: identifier.to_string(),
        password: password.to_string(),
    }
}
