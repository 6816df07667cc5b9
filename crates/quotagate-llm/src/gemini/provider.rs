//! Gemini dispatcher implementation

use super::config::GeminiConfig;
use super::security::sanitize_api_error;
use super::types::{GeminiError, GeminiRequest, GeminiResponse};
use crate::dispatcher::{DispatchError, DispatchResult, Dispatcher};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Gemini dispatcher
pub struct GeminiDispatcher {
    client: Client,
    config: GeminiConfig,
}

impl GeminiDispatcher {
    /// Create a new Gemini dispatcher
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Single attempt against one model
    async fn send_once(&self, model: &str, request: &GeminiRequest) -> Result<String> {
        // SECURITY: Don't log the full URL (contains API key)
        debug!("Sending request to Gemini model: {}", model);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(sanitize_api_error(&e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(sanitize_api_error(&e.to_string())))?;

        if !status.is_success() {
            warn!(status = %status, model = %model, "Gemini API error response");

            if status.as_u16() == 429 {
                return Err(Error::RateLimit);
            }

            let detail = match serde_json::from_str::<GeminiError>(&body) {
                Ok(error) => {
                    warn!(
                        error_status = %error.error.status,
                        error_code = error.error.code,
                        "Gemini API error detail"
                    );
                    format!("{}: {}", error.error.status, error.error.message)
                }
                Err(_) => format!("HTTP {}", status),
            };

            if status.is_server_error() {
                return Err(Error::ServerError(sanitize_api_error(&detail)));
            }
            return Err(Error::Api(sanitize_api_error(&detail)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        Ok(parsed.first_text())
    }
}

#[async_trait]
impl Dispatcher for GeminiDispatcher {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn dispatch(&self, prompt: &str) -> DispatchResult {
        let request = GeminiRequest::from_text(self.config.template.render(prompt));
        let chain = self.config.model_chain();
        let mut last_error = DispatchError::Failed;

        for (idx, model) in chain.iter().enumerate() {
            match self.send_once(model, &request).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    last_error = DispatchError::from(&e);
                    let next = chain.get(idx + 1);
                    match next {
                        Some(next_model) if e.is_transient() => {
                            warn!(
                                from = %model,
                                to = %next_model,
                                error = %e,
                                "Gemini dispatch failed, trying fallback model"
                            );
                        }
                        _ => {
                            warn!(model = %model, error = %e, "Gemini dispatch failed");
                            return Err(last_error);
                        }
                    }
                }
            }
        }

        Err(last_error)
    }
}
