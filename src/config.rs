use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `token.secret`.
pub const JWT_SECRET_ENV: &str = "STOREFRONT_JWT_SECRET";

/// Minimum accepted length (bytes) for a configured signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest lock a failed-login streak may impose (30 days).
pub const MAX_LOCK_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest lifetime an issued token may have (one year).
pub const MAX_TOKEN_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub token: TokenConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Failed-login lockout policy.
    pub lockout: LockoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Consecutive failed attempts that lock the account.
    pub max_attempts: u32,

    /// How long a lock lasts once applied.
    pub lock_duration_seconds: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration_seconds: 2 * 60 * 60,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            lockout: LockoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC signing secret. Empty means "generate one at startup".
    pub secret: String,

    /// Token lifetime in seconds (default: 7 days)
    pub expiry_seconds: u64,

    /// Value of the `iss` claim, checked on verification.
    pub issuer: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiry_seconds: 7 * 24 * 60 * 60,
            issuer: "storefront".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5500".to_string(),
                "http://127.0.0.1:5500".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/storefront.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Environment overrides, applied after the file is read.
    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV)
            && !secret.is_empty()
        {
            self.token.secret = secret;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("storefront").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".storefront").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.lockout.max_attempts == 0 {
            anyhow::bail!("security.lockout.max_attempts must be > 0");
        }

        if !(1..=MAX_LOCK_DURATION_SECS).contains(&self.security.lockout.lock_duration_seconds) {
            anyhow::bail!(
                "security.lockout.lock_duration_seconds must be between 1 and {MAX_LOCK_DURATION_SECS}"
            );
        }

        if !(1..=MAX_TOKEN_EXPIRY_SECS).contains(&self.token.expiry_seconds) {
            anyhow::bail!("token.expiry_seconds must be between 1 and {MAX_TOKEN_EXPIRY_SECS}");
        }

        if !self.token.secret.is_empty() && self.token.secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("token.secret must be at least {MIN_SECRET_LEN} bytes long");
        }

        if self.general.max_db_connections < self.general.min_db_connections {
            anyhow::bail!("general.max_db_connections must be >= min_db_connections");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.lockout.max_attempts, 5);
        assert_eq!(config.security.lockout.lock_duration_seconds, 7200);
        assert_eq!(config.token.expiry_seconds, 604_800);
        assert!(config.token.secret.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security.lockout]"));
        assert!(toml_str.contains("[token]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security.lockout]
            max_attempts = 3
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.lockout.max_attempts, 3);
        assert_eq!(config.security.lockout.lock_duration_seconds, 7200);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = Config::default();
        config.token.secret = "too-short".to_string();
        assert!(config.validate().is_err());

        config.token.secret = "x".repeat(MIN_SECRET_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = Config::default();
        config.security.lockout.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_lock_duration() {
        let mut config = Config::default();
        config.security.lockout.lock_duration_seconds = MAX_LOCK_DURATION_SECS;
        assert!(config.validate().is_ok());

        config.security.lockout.lock_duration_seconds = MAX_LOCK_DURATION_SECS + 1;
        assert!(config.validate().is_err());

        config.security.lockout.lock_duration_seconds = 10_000_000_000_000;
        assert!(config.validate().is_err());

        config.security.lockout.lock_duration_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_token_expiry() {
        let mut config = Config::default();
        config.token.expiry_seconds = MAX_TOKEN_EXPIRY_SECS;
        assert!(config.validate().is_ok());

        config.token.expiry_seconds = MAX_TOKEN_EXPIRY_SECS + 1;
        assert!(config.validate().is_err());

        config.token.expiry_seconds = 0;
        assert!(config.validate().is_err());
    }
}
