//! Credential & quota gate

use crate::account::{Account, AccountStore};
use crate::error::GatewayError;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Resolves a caller identifier to an account with remaining quota
#[derive(Clone)]
pub struct CredentialGate {
    accounts: Arc<dyn AccountStore>,
}

impl CredentialGate {
    /// Create a gate over an account store
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Check an identifier. Blank identifiers count as missing.
    pub async fn check(&self, identifier: Option<&str>) -> Result<Account, GatewayError> {
        let identifier = identifier
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(GatewayError::missing_identifier)?;

        let account = match self.accounts.find_by_identifier(identifier).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                info!(identifier = %identifier, "Unknown registration number");
                return Err(GatewayError::Unauthorized);
            }
            Err(e) => {
                error!(error = %e, store = self.accounts.name(), "Account lookup failed");
                return Err(GatewayError::InternalError);
            }
        };

        if !account.has_quota() {
            info!(
                account_id = account.id,
                quota_used = account.quota_used,
                quota_limit = account.quota_limit,
                "Quota exhausted"
            );
            return Err(GatewayError::QuotaExceeded);
        }

        debug!(account_id = account.id, "Gate passed");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{NewAccount, SqliteAccountStore};
    use crate::db::Database;

    async fn setup() -> (CredentialGate, Arc<SqliteAccountStore>) {
        let db = Database::in_memory().await.unwrap();
        let store = Arc::new(SqliteAccountStore::new(db.pool().clone()));
        (CredentialGate::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_missing_identifier() {
        let (gate, _) = setup().await;
        assert_eq!(gate.check(None).await, Err(GatewayError::missing_identifier()));
        assert_eq!(gate.check(Some("  ")).await, Err(GatewayError::missing_identifier()));
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let (gate, _) = setup().await;
        assert_eq!(gate.check(Some("NOPE")).await, Err(GatewayError::Unauthorized));
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let (gate, store) = setup().await;
        let account = store
            .create(NewAccount::new("A", "R1").with_limit(1))
            .await
            .unwrap();

        let passed = gate.check(Some("R1")).await.unwrap();
        assert_eq!(passed.id, account.id);

        store.increment_usage(account.id).await.unwrap();
        assert_eq!(gate.check(Some("R1")).await, Err(GatewayError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let (gate, store) = setup().await;
        store
            .create(NewAccount::new("A", "R0").with_limit(0))
            .await
            .unwrap();
        assert_eq!(gate.check(Some("R0")).await, Err(GatewayError::QuotaExceeded));
    }
}
