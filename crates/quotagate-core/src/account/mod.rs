//! Caller accounts
//!
//! An account is entitled to `quota_limit` upstream calls. Requests are
//! admitted only while `quota_used < quota_limit`.

mod sqlite;

pub use sqlite::SqliteAccountStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;

/// Default quota for new accounts
pub const DEFAULT_QUOTA_LIMIT: i64 = 50;

/// Persisted caller account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Primary key
    pub id: i64,
    /// Display name
    pub name: String,
    /// Caller-supplied identifier
    pub registration_number: String,
    /// Issued key (`sg-` + 16 hex chars)
    pub api_key: String,
    /// Maximum upstream calls
    pub quota_limit: i64,
    /// Upstream calls consumed
    pub quota_used: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Whether another upstream call is allowed
    #[must_use]
    pub fn has_quota(&self) -> bool {
        self.quota_used < self.quota_limit
    }
}

/// Input for account creation
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Unique identifier
    pub registration_number: String,
    /// Quota limit
    pub quota_limit: i64,
}

impl NewAccount {
    /// Create with the default quota
    pub fn new(name: impl Into<String>, registration_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registration_number: registration_number.into(),
            quota_limit: DEFAULT_QUOTA_LIMIT,
        }
    }

    /// Set the quota limit
    #[must_use]
    pub fn with_limit(mut self, quota_limit: i64) -> Self {
        self.quota_limit = quota_limit;
        self
    }
}

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up by registration number
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>>;

    /// Look up by primary key
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Atomically add one to `quota_used`. Returns false if no row matched.
    async fn increment_usage(&self, id: i64) -> Result<bool>;

    /// Atomically add a positive `amount` to `quota_limit`. Returns false if
    /// no row matched; fails with `InvalidInput` if the sum would overflow.
    async fn increase_limit(&self, id: i64, amount: i64) -> Result<bool>;

    /// Create an account, issuing a fresh API key
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// All accounts, oldest first
    async fn list(&self) -> Result<Vec<Account>>;

    /// Number of accounts
    async fn count(&self) -> Result<i64>;

    /// Store name (for logging)
    fn name(&self) -> &str;
}

/// Generate an account API key: `sg-` followed by 16 lowercase hex chars
#[must_use]
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("sg-{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_format() {
        let key = generate_api_key();
        assert_eq!(key.len(), 19);
        assert!(key.starts_with("sg-"));
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_has_quota() {
        let mut account = Account {
            id: 1,
            name: "a".into(),
            registration_number: "R1".into(),
            api_key: generate_api_key(),
            quota_limit: 50,
            quota_used: 49,
            created_at: Utc::now(),
        };
        assert!(account.has_quota());
        account.quota_used = 50;
        assert!(!account.has_quota());
    }
}
