//! Failed-login lockout policy.
//!
//! The policy itself is pure: it decides which transition a failed attempt
//! should cause. The store applies the transition with a conditional
//! `UPDATE`, so the decision made here is re-checked against the row at
//! write time.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::config::{LockoutConfig, MAX_LOCK_DURATION_SECS};
use crate::models::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

/// What a failed attempt does to the stored counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureTransition {
    /// The lock has run out: count restarts at 1 and the lock is cleared.
    ForgiveExpiredLock,
    /// Count goes up by one; `lock_until` is set when the new count
    /// reaches the threshold on an account that is not already locked.
    Increment {
        attempts: u32,
        lock_until: Option<DateTime<Utc>>,
    },
}

impl LockoutPolicy {
    pub fn from_config(config: &LockoutConfig) -> Result<Self> {
        if config.lock_duration_seconds > MAX_LOCK_DURATION_SECS {
            anyhow::bail!(
                "Lock duration of {}s exceeds the {MAX_LOCK_DURATION_SECS}s maximum",
                config.lock_duration_seconds
            );
        }
        let lock_duration = i64::try_from(config.lock_duration_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .context("Lock duration is out of range")?;

        Ok(Self {
            max_attempts: config.max_attempts,
            lock_duration,
        })
    }

    pub fn lock_deadline(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_add_signed(self.lock_duration)
            .context("Lock deadline is out of range")
    }

    pub fn on_failure(&self, account: &Account, now: DateTime<Utc>) -> Result<FailureTransition> {
        if account.has_expired_lock(now) {
            return Ok(FailureTransition::ForgiveExpiredLock);
        }

        let attempts = account.login_attempts.saturating_add(1);
        let lock_until = if attempts >= self.max_attempts && !account.is_locked(now) {
            Some(self.lock_deadline(now)?)
        } else {
            None
        };

        Ok(FailureTransition::Increment {
            attempts,
            lock_until,
        })
    }
}
