//! Error types for quotagate-core

use quotagate_llm::DispatchError;
use serde_json::{json, Value};
use thiserror::Error;

/// Message for a request without a registration number
pub const MISSING_IDENTIFIER: &str = "Missing registration number";

/// Message for a body without a usable prompt
pub const INVALID_PROMPT: &str = "Invalid prompt";

/// Storage and infrastructure error type
#[derive(Debug, Error)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rejected input (e.g. a quota increase that would overflow)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Cache backend error
    #[error("cache error: {0}")]
    Cache(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict(db.message().to_string())
            }
            _ => Error::Database(err.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a rejected pipeline request.
///
/// Each variant maps to exactly one HTTP status and one short message; the
/// `Display` text is the message sent to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Missing identifier or invalid prompt
    #[error("{0}")]
    BadRequest(String),

    /// No account matches the identifier
    #[error("Not Authorized")]
    Unauthorized,

    /// `quota_used >= quota_limit`
    #[error("API limit reached. Plan expired.")]
    QuotaExceeded,

    /// Another dispatch was admitted within the cooldown window
    #[error("Cooldown in progress. Try again later.")]
    CooldownActive,

    /// Upstream provider answered 429
    #[error("Rate limited")]
    RateLimited,

    /// Upstream call failed
    #[error("Failed to send prompt")]
    DispatchFailed,

    /// Storage failure on the request path
    #[error("Internal server error")]
    InternalError,
}

impl GatewayError {
    /// 400 for a missing registration number
    #[must_use]
    pub fn missing_identifier() -> Self {
        GatewayError::BadRequest(MISSING_IDENTIFIER.to_string())
    }

    /// 400 for a missing or non-string prompt
    #[must_use]
    pub fn invalid_prompt() -> Self {
        GatewayError::BadRequest(INVALID_PROMPT.to_string())
    }

    /// HTTP status code
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::Unauthorized => 404,
            GatewayError::QuotaExceeded => 403,
            GatewayError::CooldownActive => 429,
            // provider 429 is reported as a server-side failure
            GatewayError::RateLimited => 500,
            GatewayError::DispatchFailed => 500,
            GatewayError::InternalError => 500,
        }
    }

    /// JSON error body
    #[must_use]
    pub fn body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::RateLimited => GatewayError::RateLimited,
            DispatchError::Failed => GatewayError::DispatchFailed,
        }
    }
}
