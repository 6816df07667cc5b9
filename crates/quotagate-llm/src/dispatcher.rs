//! Provider-agnostic dispatch contract
//!
//! A dispatcher never lets a transport fault escape: every failure path
//! resolves to a [`DispatchError`] value.

use crate::error::Error;
use async_trait::async_trait;
use thiserror::Error as ThisError;

/// Tagged failure of a dispatch.
///
/// The `Display` text is exactly what the gateway reports to callers, so it
/// must stay short and free of provider details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum DispatchError {
    /// The provider answered HTTP 429
    #[error("Rate limited")]
    RateLimited,
    /// Any other failure (network, non-success status, malformed body)
    #[error("Failed to send prompt")]
    Failed,
}

impl From<&Error> for DispatchError {
    fn from(err: &Error) -> Self {
        match err {
            Error::RateLimit => DispatchError::RateLimited,
            _ => DispatchError::Failed,
        }
    }
}

/// Result of a dispatch: the raw (untrimmed) answer text or a tagged error.
pub type DispatchResult = std::result::Result<String, DispatchError>;

/// Sends a caller prompt upstream and interprets the reply.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Model the next dispatch will try first
    fn model(&self) -> &str;

    /// Dispatch a raw caller prompt
    async fn dispatch(&self, prompt: &str) -> DispatchResult;
}
