//! Argon2id password hashing.
//!
//! Both hashing and verification are CPU heavy, so the async wrappers move
//! them onto the blocking pool instead of stalling a runtime worker.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::sync::OnceCell;
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `password` against a PHC hash string. The parameters embedded in
/// the hash are used, so hashes made under older settings still verify.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash_password_blocking(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}

/// Stand-in hash checked when no account matches a sign-in, so unknown
/// identifiers cost the same Argon2 work as wrong passwords.
///
/// Built lazily with the configured cost from a random password nobody can
/// know.
pub struct DecoyHash {
    hash: OnceCell<String>,
    config: SecurityConfig,
}

impl DecoyHash {
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            hash: OnceCell::new(),
            config,
        }
    }

    pub async fn hash(&self) -> Result<&str> {
        let hash = self
            .hash
            .get_or_try_init(|| {
                hash_password_blocking(Uuid::new_v4().to_string(), self.config.clone())
            })
            .await?;
        Ok(hash.as_str())
    }

    /// Runs a full verification and discards the result.
    pub async fn verify(&self, password: String) -> Result<()> {
        let hash = self.hash().await?.to_string();
        verify_password_blocking(password, hash).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 64,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("secret1", &cheap_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let config = cheap_config();
        let a = hash_password("secret1", &config).unwrap();
        let b = hash_password("secret1", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("secret1", "not-a-phc-string").is_err());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let config = SecurityConfig {
            argon2_time_cost: 0,
            ..cheap_config()
        };
        assert!(hash_password("secret1", &config).is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_agree() {
        let hash = hash_password_blocking("secret1".to_string(), cheap_config())
            .await
            .unwrap();
        assert!(
            verify_password_blocking("secret1".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn decoy_hash_uses_configured_cost_and_is_reused() {
        let decoy = DecoyHash::new(cheap_config());
        decoy.verify("secret1".to_string()).await.unwrap();

        let first = decoy.hash().await.unwrap().to_string();
        assert!(first.starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
        assert_eq!(decoy.hash().await.unwrap(), first);
        assert!(!verify_password("secret1", &first).unwrap());
    }
}
