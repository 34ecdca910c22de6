//! Account domain model and its public projection.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, Role};
use crate::entities::accounts;
use crate::models::cart::CartItem;

pub const DEFAULT_AVATAR: &str = "default-avatar.png";

/// Formats a timestamp the way every timestamp column is stored.
///
/// Fixed-width UTC with microseconds, so the store can compare the strings
/// lexicographically and get chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid stored timestamp: {value}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Lock state derived from `lock_until` at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { until: DateTime<Utc> },
}

/// Optional contact details editable through the profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub avatar: String,
}

/// Account as held by the service. Carries lockout counters but never the
/// password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub profile: ProfileDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[must_use]
    pub fn lock_state(&self, now: DateTime<Utc>) -> LockState {
        match self.lock_until {
            Some(until) if until > now => LockState::Locked { until },
            _ => LockState::Unlocked,
        }
    }

    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_state(now), LockState::Locked { .. })
    }

    /// A lock that was applied and has since run out.
    #[must_use]
    pub fn has_expired_lock(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until <= now)
    }

    #[must_use]
    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
            is_active: self.is_active,
            last_login: self.last_login,
            profile: self.profile.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            cart: None,
        }
    }
}

impl TryFrom<accounts::Model> for Account {
    type Error = anyhow::Error;

    fn try_from(model: accounts::Model) -> Result<Self> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| anyhow::anyhow!("Account {}: {e}", model.id))?;

        Ok(Self {
            id: AccountId::new(model.id),
            full_name: model.full_name,
            email: model.email,
            username: model.username,
            role,
            is_active: model.is_active,
            login_attempts: u32::try_from(model.login_attempts).unwrap_or(0),
            lock_until: model.lock_until.as_deref().map(parse_timestamp).transpose()?,
            last_login: model.last_login.as_deref().map(parse_timestamp).transpose()?,
            profile: ProfileDetails {
                phone: model.phone,
                address: model.address,
                city: model.city,
                country: model.country,
                zip_code: model.zip_code,
                avatar: model.avatar,
            },
            created_at: parse_timestamp(&model.created_at)?,
            updated_at: parse_timestamp(&model.updated_at)?,
        })
    }
}

/// What callers get to see of an account: no password hash, no lockout
/// counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: AccountId,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub profile: ProfileDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<CartItem>>,
}

impl PublicAccount {
    #[must_use]
    pub fn with_cart(mut self, cart: Vec<CartItem>) -> Self {
        self.cart = Some(cart);
        self
    }
}

/// Fields accepted when creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Partial profile update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub profile: Option<ProfileDetails>,
}
