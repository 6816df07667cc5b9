//! Dispatcher construction

use super::config::GeminiAppConfig;
use anyhow::{Context, Result};
use quotagate_llm::{Dispatcher, GeminiConfig, GeminiDispatcher, PromptTemplate};
use std::sync::Arc;
use std::time::Duration;

/// Build the Gemini dispatcher. The API key is read from `GEMINI_API_KEY` or
/// `GOOGLE_API_KEY`; everything else comes from the `[gemini]` section.
pub fn build_dispatcher(config: &GeminiAppConfig) -> Result<Arc<dyn Dispatcher>> {
    let gemini = GeminiConfig::from_env()
        .context("Gemini API key missing. Set GEMINI_API_KEY or GOOGLE_API_KEY")?
        .with_base_url(config.base_url.trim_end_matches('/'))
        .with_model(config.model.clone())
        .with_fallback_models(config.fallback_models.clone())
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_template(PromptTemplate::new(config.instruction_template.clone()));

    let dispatcher = GeminiDispatcher::new(gemini).context("Failed to build Gemini client")?;
    Ok(Arc::new(dispatcher))
}
