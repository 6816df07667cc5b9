//! Server module for Quotagate
//!
//! Contains server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration validation
//! - `init_stores`: Database, cache and pipeline construction
//! - `providers`: Gemini dispatcher construction
//! - `init`: Router assembly and the run loop

pub mod config;
mod init;
mod init_stores;
mod loader;
mod providers;
mod validation;

pub use init::{build_app, run};
pub use init_stores::{init_services, open_database, Services};
pub use loader::load_config;
