//! Quotagate Core - Dispatch Pipeline
//!
//! This crate provides the request path of the Quotagate gateway:
//! - Gate: registration-number lookup and quota check
//! - Cooldown: process-wide single-flight admission window
//! - Cache: prompt-keyed answer cache (Redis or in-memory)
//! - Accountant: quota consumption on real upstream calls
//! - Audit: one usage log record per request
//! - Pipeline: sequencing of all of the above
//!
//! Persistence lives in SQLite (`db`, `account`, `audit`, `admin`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accountant;
pub mod account;
pub mod admin;
pub mod audit;
pub mod cache;
pub mod cooldown;
pub mod db;
pub mod error;
pub mod gate;
pub mod pipeline;

pub use account::{Account, AccountStore, NewAccount, SqliteAccountStore};
pub use accountant::UsageAccountant;
pub use admin::{Admin, AdminStore};
pub use audit::{Analytics, AuditLogger, LogStore, NewUsageLog, SqliteLogStore, UsageLogRecord};
pub use cache::{CacheBackend, CacheSettings, MemoryCache, RedisCache, ResponseCache};
pub use cooldown::CooldownGuard;
pub use db::Database;
pub use error::{Error, GatewayError, Result};
pub use gate::CredentialGate;
pub use pipeline::{AskRequest, DispatchPipeline, PipelineResponse};
