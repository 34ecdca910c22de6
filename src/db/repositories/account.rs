use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{AccountId, Role};
use crate::entities::{accounts, prelude::Accounts};
use crate::models::account::{
    Account, DEFAULT_AVATAR, NewAccount, ProfileChanges, format_timestamp,
};

/// Repository for account rows. Every lockout counter write is a single
/// `UPDATE` so concurrent attempts against one account serialize in `SQLite`.
pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn identifier_condition(identifier: &str) -> Condition {
        let identifier = identifier.trim();
        Condition::any()
            .add(accounts::Column::Email.eq(identifier.to_lowercase()))
            .add(accounts::Column::Username.eq(identifier))
    }

    /// Look up by email (case-insensitive) or username.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>> {
        let model = Accounts::find()
            .filter(Self::identifier_condition(identifier))
            .one(&self.conn)
            .await
            .context("Failed to query account by identifier")?;

        model.map(Account::try_from).transpose()
    }

    /// Same lookup as [`Self::find_by_identifier`], also returning the stored
    /// password hash for verification.
    pub async fn find_credentials(&self, identifier: &str) -> Result<Option<(Account, String)>> {
        let model = Accounts::find()
            .filter(Self::identifier_condition(identifier))
            .one(&self.conn)
            .await
            .context("Failed to query account credentials")?;

        model
            .map(|m| {
                let hash = m.password_hash.clone();
                Account::try_from(m).map(|account| (account, hash))
            })
            .transpose()
    }

    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let model = Accounts::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        model.map(Account::try_from).transpose()
    }

    pub async fn password_hash(&self, id: AccountId) -> Result<Option<String>> {
        let model = Accounts::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account password hash")?;

        Ok(model.map(|m| m.password_hash))
    }

    /// True when either identifier is already taken.
    pub async fn identifiers_taken(&self, email: &str, username: &str) -> Result<bool> {
        let existing = Accounts::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Email.eq(email.to_lowercase()))
                    .add(accounts::Column::Username.eq(username)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check for existing account")?;

        Ok(existing.is_some())
    }

    pub async fn email_taken_by_other(&self, email: &str, id: AccountId) -> Result<bool> {
        let existing = Accounts::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .filter(accounts::Column::Id.ne(id.value()))
            .one(&self.conn)
            .await
            .context("Failed to check email availability")?;

        Ok(existing.is_some())
    }

    pub async fn create(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        let now = format_timestamp(now);

        let active = accounts::ActiveModel {
            full_name: Set(account.full_name),
            email: Set(account.email.to_lowercase()),
            username: Set(account.username),
            password_hash: Set(account.password_hash),
            role: Set(Role::User.as_str().to_string()),
            is_active: Set(true),
            login_attempts: Set(0),
            lock_until: Set(None),
            last_login: Set(None),
            phone: Set(None),
            address: Set(None),
            city: Set(None),
            country: Set(None),
            zip_code: Set(None),
            avatar: Set(DEFAULT_AVATAR.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Account::try_from(model)
    }

    /// Success path: clear counters and lock, stamp `last_login`.
    pub async fn record_successful_login(&self, id: AccountId, now: DateTime<Utc>) -> Result<()> {
        let now = format_timestamp(now);

        Accounts::update_many()
            .col_expr(accounts::Column::LoginAttempts, Expr::value(0))
            .col_expr(accounts::Column::LockUntil, Expr::value(Option::<String>::None))
            .col_expr(accounts::Column::LastLogin, Expr::value(now.clone()))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to record successful login")?;

        Ok(())
    }

    /// Restarts the count at 1 if, and only if, the stored lock has run out.
    ///
    /// Returns false when no expired lock was present at write time (another
    /// request got there first, or the lock is still active).
    pub async fn forgive_expired_lock(&self, id: AccountId, now: DateTime<Utc>) -> Result<bool> {
        let now = format_timestamp(now);

        let result = Accounts::update_many()
            .col_expr(accounts::Column::LoginAttempts, Expr::value(1))
            .col_expr(accounts::Column::LockUntil, Expr::value(Option::<String>::None))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(accounts::Column::Id.eq(id.value()))
            .filter(accounts::Column::LockUntil.is_not_null())
            .filter(accounts::Column::LockUntil.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to reset expired lock")?;

        Ok(result.rows_affected == 1)
    }

    /// Adds one failed attempt and, when the new count reaches `threshold`
    /// on an account that is not currently locked, sets `lock_until` to
    /// `locked_until`. Evaluated in one statement against the row's
    /// pre-update values.
    pub async fn increment_failed_attempts(
        &self,
        id: AccountId,
        threshold: u32,
        locked_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = format_timestamp(now);
        let previous_needed = i32::try_from(threshold.saturating_sub(1)).unwrap_or(i32::MAX);

        let not_locked = Condition::any()
            .add(Expr::col(accounts::Column::LockUntil).is_null())
            .add(Expr::col(accounts::Column::LockUntil).lte(now.clone()));

        let should_lock = Condition::all()
            .add(Expr::col(accounts::Column::LoginAttempts).gte(previous_needed))
            .add(not_locked);

        let lock_expr = Expr::case(should_lock, Expr::value(format_timestamp(locked_until)))
            .finally(Expr::col(accounts::Column::LockUntil));

        Accounts::update_many()
            .col_expr(
                accounts::Column::LoginAttempts,
                Expr::col(accounts::Column::LoginAttempts).add(1),
            )
            .col_expr(accounts::Column::LockUntil, lock_expr.into())
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to record failed login attempt")?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: AccountId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>> {
        let Some(model) = Accounts::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account for profile update")?
        else {
            return Ok(None);
        };

        let mut active: accounts::ActiveModel = model.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email.to_lowercase());
        }
        if let Some(profile) = changes.profile {
            active.phone = Set(profile.phone);
            active.address = Set(profile.address);
            active.city = Set(profile.city);
            active.country = Set(profile.country);
            active.zip_code = Set(profile.zip_code);
            active.avatar = Set(profile.avatar);
        }
        active.updated_at = Set(format_timestamp(now));

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update account profile")?;

        Account::try_from(model).map(Some)
    }

    pub async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        Accounts::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(format_timestamp(now)))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    pub async fn set_role(&self, id: AccountId, role: Role, now: DateTime<Utc>) -> Result<bool> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::Role, Expr::value(role.as_str()))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(format_timestamp(now)))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update role")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn set_active(&self, id: AccountId, active: bool, now: DateTime<Utc>) -> Result<bool> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::IsActive, Expr::value(active))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(format_timestamp(now)))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update account status")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let models = Accounts::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        models.into_iter().map(Account::try_from).collect()
    }
}
