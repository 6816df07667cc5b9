//! Usage accountant
//!
//! Consumes one unit of quota per real (non-cached) upstream call. The update
//! runs as a tracked background task and never affects the response.

use crate::account::AccountStore;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// Records quota consumption
#[derive(Clone)]
pub struct UsageAccountant {
    accounts: Arc<dyn AccountStore>,
    tracker: TaskTracker,
}

impl UsageAccountant {
    /// Create an accountant that spawns onto `tracker`
    pub fn new(accounts: Arc<dyn AccountStore>, tracker: TaskTracker) -> Self {
        Self { accounts, tracker }
    }

    /// Schedule `quota_used += 1` for the account
    pub fn record_use(&self, account_id: i64) {
        let accounts = Arc::clone(&self.accounts);
        self.tracker.spawn(async move {
            match accounts.increment_usage(account_id).await {
                Ok(true) => debug!(account_id, "Usage recorded"),
                Ok(false) => warn!(account_id, "Usage not recorded, account missing"),
                Err(e) => error!(account_id, error = %e, "Failed to record usage"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{NewAccount, SqliteAccountStore};
    use crate::db::Database;

    #[tokio::test]
    async fn test_record_use_increments_once_per_call() {
        let db = Database::in_memory().await.unwrap();
        let store = Arc::new(SqliteAccountStore::new(db.pool().clone()));
        let account = store.create(NewAccount::new("A", "R")).await.unwrap();

        let tracker = TaskTracker::new();
        let accountant = UsageAccountant::new(store.clone(), tracker.clone());
        accountant.record_use(account.id);
        accountant.record_use(account.id);
        accountant.record_use(9999);

        tracker.close();
        tracker.wait().await;

        let reloaded = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quota_used, 2);
    }
}
