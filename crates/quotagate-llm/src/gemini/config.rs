//! Gemini dispatcher configuration

use crate::error::{Error, Result};
use crate::prompt::PromptTemplate;
use crate::util::mask_api_key;
use std::fmt;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-002";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gemini dispatcher configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (sent as `?key=` on the request URL)
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Primary model
    pub model: String,
    /// Models tried in order when the primary is rate limited or failing
    pub fallback_models: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Instruction template wrapped around each prompt
    pub template: PromptTemplate,
}

// SECURITY: Custom Debug implementation to mask credentials
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("fallback_models", &self.fallback_models)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fallback_models: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            template: PromptTemplate::default(),
        }
    }

    /// Create configuration from `GEMINI_API_KEY` / `GOOGLE_API_KEY`.
    ///
    /// `GEMINI_BASE_URL` and `GEMINI_MODEL` override the defaults when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                Error::NotConfigured("GEMINI_API_KEY or GOOGLE_API_KEY not set".to_string())
            })?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the primary model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the fallback chain
    #[must_use]
    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the instruction template
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Primary model followed by the fallback chain, without duplicates
    pub(crate) fn model_chain(&self) -> Vec<&str> {
        let mut chain: Vec<&str> = vec![self.model.as_str()];
        for model in &self.fallback_models {
            if !chain.contains(&model.as_str()) {
                chain.push(model.as_str());
            }
        }
        chain
    }
}
