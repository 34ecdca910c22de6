use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{AccountId, Role};
use crate::models::account::{Account, NewAccount, ProfileChanges};
use crate::models::cart::{CartItem, NewCartItem};

pub mod migrator;
pub mod repositories;

pub use repositories::account::AccountRepository;
pub use repositories::cart::CartRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> AccountRepository {
        AccountRepository::new(self.conn.clone())
    }

    fn cart_repo(&self) -> CartRepository {
        CartRepository::new(self.conn.clone())
    }

    // ========== Account Repository Methods ==========

    pub async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<Account>> {
        self.account_repo().find_by_identifier(identifier).await
    }

    pub async fn find_account_credentials(
        &self,
        identifier: &str,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo().find_credentials(identifier).await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.account_repo().find_by_id(id).await
    }

    pub async fn get_password_hash(&self, id: AccountId) -> Result<Option<String>> {
        self.account_repo().password_hash(id).await
    }

    pub async fn identifiers_taken(&self, email: &str, username: &str) -> Result<bool> {
        self.account_repo().identifiers_taken(email, username).await
    }

    pub async fn email_taken_by_other(&self, email: &str, id: AccountId) -> Result<bool> {
        self.account_repo().email_taken_by_other(email, id).await
    }

    pub async fn create_account(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        self.account_repo().create(account, now).await
    }

    pub async fn record_successful_login(&self, id: AccountId, now: DateTime<Utc>) -> Result<()> {
        self.account_repo().record_successful_login(id, now).await
    }

    pub async fn forgive_expired_lock(&self, id: AccountId, now: DateTime<Utc>) -> Result<bool> {
        self.account_repo().forgive_expired_lock(id, now).await
    }

    pub async fn increment_failed_attempts(
        &self,
        id: AccountId,
        threshold: u32,
        locked_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.account_repo()
            .increment_failed_attempts(id, threshold, locked_until, now)
            .await
    }

    pub async fn update_account_profile(
        &self,
        id: AccountId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>> {
        self.account_repo().update_profile(id, changes, now).await
    }

    pub async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.account_repo()
            .update_password_hash(id, password_hash, now)
            .await
    }

    pub async fn set_account_role(&self, id: AccountId, role: Role) -> Result<bool> {
        self.account_repo().set_role(id, role, Utc::now()).await
    }

    pub async fn set_account_active(&self, id: AccountId, active: bool) -> Result<bool> {
        self.account_repo().set_active(id, active, Utc::now()).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list_all().await
    }

    // ========== Cart Repository Methods ==========

    pub async fn list_cart(&self, account_id: AccountId) -> Result<Vec<CartItem>> {
        self.cart_repo().list(account_id).await
    }

    pub async fn add_cart_item(
        &self,
        account_id: AccountId,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.cart_repo().add(account_id, item, now).await
    }

    pub async fn set_cart_quantity(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.cart_repo()
            .set_quantity(account_id, product_id, category, quantity, now)
            .await
    }

    pub async fn remove_cart_item(
        &self,
        account_id: AccountId,
        product_id: &str,
        category: &str,
    ) -> Result<bool> {
        self.cart_repo()
            .remove(account_id, product_id, category)
            .await
    }

    pub async fn clear_cart(&self, account_id: AccountId) -> Result<u64> {
        self.cart_repo().clear(account_id).await
    }
}
