//! Middleware module for Quotagate HTTP server
//!
//! Provides:
//! - Admin authentication (panel key + bearer token)

pub mod auth;
