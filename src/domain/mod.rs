//! Domain primitives for accounts.
//!
//! Newtype wrappers keep account ids from being mixed up with cart line ids
//! and other integers flowing through the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an account.
///
/// # Examples
///
/// ```rust
/// use storefront::domain::AccountId;
///
/// let id = AccountId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId(i32);

impl AccountId {
    /// Creates a new `AccountId` from a raw i32 value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "AccountId should be non-negative");
        Self(id)
    }

    /// Returns the underlying i32 value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AccountId> for i32 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl From<i32> for AccountId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Parses the decimal form used in the token `sub` claim.
impl FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i32 = s.parse()?;
        Ok(Self(id))
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self(id))
    }
}

/// Account role. Stored as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parses_from_claim() {
        let id: AccountId = "17".parse().unwrap();
        assert_eq!(id, AccountId::new(17));
        assert!("abc".parse::<AccountId>().is_err());
    }

    #[test]
    fn account_id_serde_is_transparent() {
        let json = serde_json::to_string(&AccountId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), 9);
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }
}
