//! Error types for quotagate-llm

use thiserror::Error;

/// LLM error type
///
/// These describe a single provider attempt. Callers of a [`crate::Dispatcher`]
/// only ever see the coarser [`crate::DispatchError`].
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error (non-success status other than 429/5xx)
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimit,

    /// Provider-side failure (HTTP 5xx)
    #[error("server error: {0}")]
    ServerError(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

impl Error {
    /// Whether trying the next model in the fallback chain can help.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::RateLimit | Error::ServerError(_) | Error::Network(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
