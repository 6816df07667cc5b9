//! Audit logging
//!
//! Exactly one [`UsageLogRecord`] is appended per pipeline request, whatever
//! the outcome. Writes run as tracked background tasks.

mod sqlite;

pub use sqlite::SqliteLogStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

/// Caller identity used when neither a header nor an account is available
pub const UNKNOWN_CALLER: &str = "UNKNOWN";

/// Stored audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageLogRecord {
    /// Primary key
    pub id: i64,
    /// Account id, when the gate resolved one
    pub user_id: Option<i64>,
    /// Caller identity
    pub api_key: String,
    /// Matched route path
    pub endpoint: String,
    /// HTTP method
    pub request_method: String,
    /// Request body (`null` when not JSON)
    pub request_payload: Value,
    /// Response body as sent
    pub response_payload: Value,
    /// Response status as sent
    pub response_status: i64,
    /// Time of the request
    pub used_at: DateTime<Utc>,
    /// Client address
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
}

/// Audit record before insertion
#[derive(Debug, Clone)]
pub struct NewUsageLog {
    /// Account id, when resolved
    pub user_id: Option<i64>,
    /// Caller identity
    pub api_key: String,
    /// Matched route path
    pub endpoint: String,
    /// HTTP method
    pub request_method: String,
    /// Request body
    pub request_payload: Value,
    /// Response body
    pub response_payload: Value,
    /// Response status
    pub response_status: u16,
    /// Time of the request
    pub used_at: DateTime<Utc>,
    /// Client address
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
}

/// Aggregate request statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    /// All logged requests
    pub total_requests: i64,
    /// Requests answered with 2xx
    pub successful: i64,
    /// All other requests
    pub failed: i64,
    /// Newest records with status >= 400
    pub recent_errors: Vec<UsageLogRecord>,
}

impl Analytics {
    /// Share of successful requests in percent (0 when nothing was logged)
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful as f64 * 100.0 / self.total_requests as f64
    }

    /// Share of failed requests in percent (0 when nothing was logged)
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.failed as f64 * 100.0 / self.total_requests as f64
    }
}

/// Audit log persistence
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append a record, returning its id
    async fn append(&self, entry: NewUsageLog) -> Result<i64>;

    /// Newest records first
    async fn recent(&self, limit: i64) -> Result<Vec<UsageLogRecord>>;

    /// Totals plus the newest `error_limit` failures
    async fn analytics(&self, error_limit: i64) -> Result<Analytics>;

    /// Store name (for logging)
    fn name(&self) -> &str;
}

/// Spawns audit writes
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn LogStore>,
    tracker: TaskTracker,
}

impl AuditLogger {
    /// Create a logger that spawns onto `tracker`
    pub fn new(store: Arc<dyn LogStore>, tracker: TaskTracker) -> Self {
        Self { store, tracker }
    }

    /// Schedule an append. Failures are logged and dropped.
    pub fn record(&self, entry: NewUsageLog) {
        let store = Arc::clone(&self.store);
        self.tracker.spawn(async move {
            let status = entry.response_status;
            match store.append(entry).await {
                Ok(id) => debug!(log_id = id, status, "Usage logged"),
                Err(e) => error!(error = %e, status, store = store.name(), "Failed to write usage log"),
            }
        });
    }
}
