use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::Config;
use crate::db::Store;
use crate::services::token::{TokenIssuer, generate_secret};
use crate::services::{AuthService, CartService, SeaOrmAuthService, SeaOrmCartService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub tokens: Arc<TokenIssuer>,

    pub auth_service: Arc<dyn AuthService>,

    pub cart_service: Arc<dyn CartService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires the services over an already-connected store.
    pub fn with_store(mut config: Config, store: Store) -> anyhow::Result<Self> {
        if config.token.secret.is_empty() {
            warn!(
                "No token signing secret configured; generated a random one. \
                 Issued tokens will not survive a restart"
            );
            config.token.secret = generate_secret();
        }

        let tokens = Arc::new(TokenIssuer::from_config(&config.token)?);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        )?) as Arc<dyn AuthService>;

        let cart_service = Arc::new(SeaOrmCartService::new(store.clone()))
            as Arc<dyn CartService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tokens,
            auth_service,
            cart_service,
        })
    }
}
