//! Signed bearer tokens (HS256 JWT).

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{MAX_TOKEN_EXPIRY_SECS, TokenConfig};
use crate::domain::{AccountId, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(String),
}

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub iss: String,
}

impl Claims {
    pub fn account_id(&self) -> Result<AccountId, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid("subject is not an account id".to_string()))
    }
}

/// Issues and verifies tokens with one signing secret.
///
/// Holds no state beyond the keys, so a single instance is shared by all
/// request handlers.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    expiry: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, expiry: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            expiry,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            anyhow::bail!("Token signing secret is not configured");
        }
        if config.expiry_seconds > MAX_TOKEN_EXPIRY_SECS {
            anyhow::bail!(
                "Token expiry of {}s exceeds the {MAX_TOKEN_EXPIRY_SECS}s maximum",
                config.expiry_seconds
            );
        }
        let expiry = i64::try_from(config.expiry_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .context("token.expiry_seconds is out of range")?;
        Ok(Self::new(
            config.secret.as_bytes(),
            config.issuer.clone(),
            expiry,
        ))
    }

    /// Issues a token for the account with the configured lifetime.
    pub fn issue(&self, account_id: AccountId, role: Role) -> Result<String> {
        self.issue_with_expiry(account_id, role, self.expiry)
    }

    pub fn issue_with_expiry(
        &self,
        account_id: AccountId,
        role: Role,
        expiry: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(expiry)
            .context("Token expiry is out of range")?;
        let claims = Claims {
            sub: account_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign token")
    }

    /// Checks signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

/// Random secret for when none is configured. Tokens signed with it die with
/// the process.
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret-test-secret-test-secret", "storefront", Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = issuer();
        let token = tokens.issue(AccountId::new(7), Role::Admin).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.account_id().unwrap(), AccountId::new(7));
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "storefront");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = issuer();
        let token = tokens
            .issue_with_expiry(AccountId::new(7), Role::User, Duration::hours(-2))
            .unwrap();
        assert_eq!(tokens.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = TokenIssuer::new(b"another-secret-another-secret-xx", "storefront", Duration::hours(1));
        let token = other.issue(AccountId::new(1), Role::User).unwrap();
        assert!(matches!(issuer().verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let other = TokenIssuer::new(
            b"test-secret-test-secret-test-secret",
            "someone-else",
            Duration::hours(1),
        );
        let token = other.issue(AccountId::new(1), Role::User).unwrap();
        assert!(issuer().verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(issuer().verify("abc.def.ghi"), Err(TokenError::Invalid(_))));
        assert!(issuer().verify("").is_err());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let tokens = issuer();
        let a = tokens.issue(AccountId::new(1), Role::User).unwrap();
        let b = tokens.issue(AccountId::new(1), Role::User).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn from_config_requires_secret() {
        let mut config = TokenConfig::default();
        assert!(TokenIssuer::from_config(&config).is_err());
        config.secret = generate_secret();
        assert_eq!(config.secret.len(), 64);
        assert!(TokenIssuer::from_config(&config).is_ok());
    }

    #[test]
    fn oversized_expiry_is_rejected() {
        let mut config = TokenConfig {
            secret: generate_secret(),
            ..TokenConfig::default()
        };
        config.expiry_seconds = MAX_TOKEN_EXPIRY_SECS + 1;
        assert!(TokenIssuer::from_config(&config).is_err());

        config.expiry_seconds = u64::MAX;
        assert!(TokenIssuer::from_config(&config).is_err());

        config.expiry_seconds = MAX_TOKEN_EXPIRY_SECS;
        assert!(TokenIssuer::from_config(&config).is_ok());
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let tokens = issuer();
        assert!(
            tokens
                .issue_with_expiry(AccountId::new(1), Role::User, Duration::weeks(52 * 1_000_000))
                .is_err()
        );
    }
}
