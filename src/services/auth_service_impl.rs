//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::{AccountId, Role};
use crate::models::account::{
    Account, DEFAULT_AVATAR, NewAccount, ProfileChanges, ProfileDetails, PublicAccount,
};
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, Credentials, PasswordChange, ProfilePatch, ProfileUpdate,
    Registration,
};
use crate::services::lockout::{FailureTransition, LockoutPolicy};
use crate::services::password::{DecoyHash, hash_password_blocking, verify_password_blocking};
use crate::services::token::TokenIssuer;
use crate::services::validation::{self, FieldError};

fn count_login(outcome: &'static str) {
    metrics::counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);
}

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenIssuer>,
    policy: LockoutPolicy,
    decoy: DecoyHash,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    pub fn new(
        store: Store,
        tokens: Arc<TokenIssuer>,
        security: SecurityConfig,
    ) -> anyhow::Result<Self> {
        let policy = LockoutPolicy::from_config(&security.lockout)?;
        Ok(Self {
            store,
            tokens,
            policy,
            decoy: DecoyHash::new(security.clone()),
            security,
        })
    }

    async fn load(&self, id: AccountId) -> Result<Account, AuthError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    async fn with_cart(&self, account: &Account) -> Result<PublicAccount, AuthError> {
        let cart = self.store.list_cart(account.id).await?;
        Ok(account.public().with_cart(cart))
    }

    fn issue_session(&self, account: PublicAccount) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(account.id, account.role)?;
        Ok(AuthSession { account, token })
    }
}

/// Applies a patch on top of the stored details. Empty strings clear optional
/// fields and reset the avatar.
fn merge_profile(
    current: &ProfileDetails,
    patch: ProfilePatch,
    errors: &mut Vec<FieldError>,
) -> ProfileDetails {
    let mut field = |name: &str, value: Option<String>, existing: &Option<String>| {
        match validation::collect(validation::profile_text(name, value.as_deref()), errors) {
            Some(Some(v)) if v.is_empty() => None,
            Some(Some(v)) => Some(v),
            _ => existing.clone(),
        }
    };

    let phone = field("phone", patch.phone, &current.phone);
    let address = field("address", patch.address, &current.address);
    let city = field("city", patch.city, &current.city);
    let country = field("country", patch.country, &current.country);
    let zip_code = field("zipCode", patch.zip_code, &current.zip_code);
    let avatar = field("avatar", patch.avatar, &Some(current.avatar.clone()))
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    ProfileDetails {
        phone,
        address,
        city,
        country,
        zip_code,
        avatar,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let mut errors = Vec::new();
        let full_name = validation::collect(validation::full_name(&registration.full_name), &mut errors);
        let email = validation::collect(validation::email(&registration.email), &mut errors);
        let username = validation::collect(validation::username(&registration.username), &mut errors);
        validation::collect(
            validation::password("password", &registration.password),
            &mut errors,
        );

        let (Some(full_name), Some(email), Some(username)) = (full_name, email, username) else {
            return Err(AuthError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        if self.store.identifiers_taken(&email, &username).await? {
            debug!(username = %username, "Registration rejected: identifier taken");
            return Err(AuthError::DuplicateIdentifier);
        }

        let password_hash =
            hash_password_blocking(registration.password, self.security.clone()).await?;

        // The unique indexes catch a registration racing this one.
        let account = self
            .store
            .create_account(
                NewAccount {
                    full_name,
                    email,
                    username,
                    password_hash,
                },
                Utc::now(),
            )
            .await?;

        info!(account_id = %account.id, username = %account.username, "Account registered");

        self.issue_session(account.public())
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let mut errors = Vec::new();
        validation::collect(
            validation::required("identifier", &credentials.identifier),
            &mut errors,
        );
        if credentials.password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let Some((account, password_hash)) = self
            .store
            .find_account_credentials(&credentials.identifier)
            .await?
        else {
            self.decoy.verify(credentials.password.clone()).await?;
            count_login("unknown_identifier");
            debug!("Login failed: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        let now = Utc::now();
        if account.is_locked(now) {
            count_login("locked");
            warn!(account_id = %account.id, "Login refused: account locked");
            return Err(AuthError::AccountLocked);
        }

        if !account.is_active {
            count_login("inactive");
            warn!(account_id = %account.id, "Login refused: account deactivated");
            return Err(AuthError::InvalidCredentials);
        }

        let matches =
            verify_password_blocking(credentials.password.clone(), password_hash).await?;

        if !matches {
            self.record_outcome(&account, true).await?;

            let locked_now = self
                .store
                .get_account(account.id)
                .await?
                .is_some_and(|a| a.is_locked(Utc::now()));

            if locked_now {
                count_login("locked");
                warn!(account_id = %account.id, "Account locked after repeated failed logins");
                return Err(AuthError::AccountLocked);
            }

            count_login("invalid_password");
            warn!(account_id = %account.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.store.record_successful_login(account.id, now).await?;
        let account = self.load(account.id).await?;
        count_login("success");
        info!(account_id = %account.id, "Login succeeded");

        let public = self.with_cart(&account).await?;
        self.issue_session(public)
    }

    async fn record_outcome(&self, account: &Account, failed: bool) -> Result<(), AuthError> {
        if !failed {
            return Ok(());
        }

        let now = Utc::now();
        let deadline = self.policy.lock_deadline(now)?;

        match self.policy.on_failure(account, now)? {
            FailureTransition::ForgiveExpiredLock => {
                if self.store.forgive_expired_lock(account.id, now).await? {
                    info!(account_id = %account.id, "Expired lock cleared, attempt count restarted");
                    return Ok(());
                }
                // Another request already cleared it.
                self.store
                    .increment_failed_attempts(account.id, self.policy.max_attempts, deadline, now)
                    .await?;
            }
            FailureTransition::Increment {
                attempts,
                lock_until,
            } => {
                self.store
                    .increment_failed_attempts(account.id, self.policy.max_attempts, deadline, now)
                    .await?;
                debug!(
                    account_id = %account.id,
                    attempts,
                    locking = lock_until.is_some(),
                    "Failed login recorded"
                );
            }
        }

        Ok(())
    }

    async fn current_account(&self, token: &str) -> Result<Account, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            AuthError::Unauthorized
        })?;
        let id = claims.account_id().map_err(|_| AuthError::Unauthorized)?;

        let account = self
            .store
            .get_account(id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !account.is_active {
            return Err(AuthError::Unauthorized);
        }

        Ok(account)
    }

    async fn profile(&self, id: AccountId) -> Result<PublicAccount, AuthError> {
        let account = self.load(id).await?;
        self.with_cart(&account).await
    }

    async fn update_profile(
        &self,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<PublicAccount, AuthError> {
        let current = self.load(id).await?;

        let mut errors = Vec::new();
        let full_name = update
            .full_name
            .as_deref()
            .and_then(|v| validation::collect(validation::full_name(v), &mut errors));
        let email = update
            .email
            .as_deref()
            .and_then(|v| validation::collect(validation::email(v), &mut errors));
        let profile = update
            .profile
            .map(|patch| merge_profile(&current.profile, patch, &mut errors));

        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        if let Some(email) = &email
            && *email != current.email
            && self.store.email_taken_by_other(email, id).await?
        {
            return Err(AuthError::DuplicateIdentifier);
        }

        let updated = self
            .store
            .update_account_profile(
                id,
                ProfileChanges {
                    full_name,
                    email,
                    profile,
                },
                Utc::now(),
            )
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        info!(account_id = %id, "Profile updated");
        Ok(updated.public())
    }

    async fn change_password(
        &self,
        id: AccountId,
        change: PasswordChange,
    ) -> Result<(), AuthError> {
        let mut errors = Vec::new();
        validation::collect(
            validation::required("currentPassword", &change.current_password),
            &mut errors,
        );
        validation::collect(
            validation::password("newPassword", &change.new_password),
            &mut errors,
        );
        if !change.current_password.is_empty() && change.current_password == change.new_password {
            errors.push(FieldError::new(
                "newPassword",
                "New password must be different from current password",
            ));
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let stored_hash = self
            .store
            .get_password_hash(id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !verify_password_blocking(change.current_password, stored_hash).await? {
            return Err(AuthError::field(
                "currentPassword",
                "Current password is incorrect",
            ));
        }

        let new_hash = hash_password_blocking(change.new_password, self.security.clone()).await?;
        self.store
            .update_password_hash(id, new_hash, Utc::now())
            .await?;

        info!(account_id = %id, "Password changed");
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<PublicAccount>, AuthError> {
        let accounts = self.store.list_accounts().await?;
        Ok(accounts.iter().map(Account::public).collect())
    }

    async fn set_account_active(
        &self,
        id: AccountId,
        active: bool,
    ) -> Result<PublicAccount, AuthError> {
        if !self.store.set_account_active(id, active).await? {
            return Err(AuthError::AccountNotFound);
        }

        info!(account_id = %id, active, "Account status changed");
        Ok(self.load(id).await?.public())
    }

    async fn promote(&self, identifier: &str) -> Result<PublicAccount, AuthError> {
        let account = self
            .store
            .find_account_by_identifier(identifier)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if account.role != Role::Admin {
            self.store.set_account_role(account.id, Role::Admin).await?;
            info!(account_id = %account.id, "Account promoted to admin");
        }

        Ok(self.load(account.id).await?.public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_untouched_fields() {
        let current = ProfileDetails {
            phone: Some("555-0100".to_string()),
            city: Some("Lagos".to_string()),
            avatar: "me.png".to_string(),
            ..ProfileDetails::default()
        };
        let patch = ProfilePatch {
            city: Some("Accra".to_string()),
            ..ProfilePatch::default()
        };

        let mut errors = Vec::new();
        let merged = merge_profile(&current, patch, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(merged.phone.as_deref(), Some("555-0100"));
        assert_eq!(merged.city.as_deref(), Some("Accra"));
        assert_eq!(merged.avatar, "me.png");
    }

    #[test]
    fn merge_clears_on_empty_string() {
        let current = ProfileDetails {
            phone: Some("555-0100".to_string()),
            avatar: "me.png".to_string(),
            ..ProfileDetails::default()
        };
        let patch = ProfilePatch {
            phone: Some(String::new()),
            avatar: Some("  ".to_string()),
            ..ProfilePatch::default()
        };

        let mut errors = Vec::new();
        let merged = merge_profile(&current, patch, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(merged.phone, None);
        assert_eq!(merged.avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn merge_reports_oversized_fields() {
        let patch = ProfilePatch {
            address: Some("x".repeat(500)),
            ..ProfilePatch::default()
        };

        let mut errors = Vec::new();
        let merged = merge_profile(&ProfileDetails::default(), patch, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "address");
        assert_eq!(merged.address, None);
    }
}
