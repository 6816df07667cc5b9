//! Gemini - Google Gemini API dispatcher
//!
//! This module implements the `generateContent` call using reqwest.

mod config;
mod provider;
mod security;
mod types;

#[cfg(test)]
mod tests;

pub use config::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use provider::GeminiDispatcher;
