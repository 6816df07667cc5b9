//! Quotagate LLM - Upstream Provider Dispatch
//!
//! This crate talks to the third-party generative-language API for Quotagate:
//! - Dispatcher: the provider-agnostic `dispatch(prompt)` contract
//! - Gemini: Google Gemini `generateContent` implementation with model fallback
//! - Prompt: the instruction template wrapped around every caller prompt

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod util;

pub use dispatcher::{DispatchError, DispatchResult, Dispatcher};
pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiDispatcher, DEFAULT_MODEL};
pub use prompt::{PromptTemplate, DEFAULT_INSTRUCTION_TEMPLATE};
