//! Core types and shared functionality for the Tablemate offline gateway.
//!
//! This crate provides:
//! - Durable partitioned response cache with SQLite backend
//! - Unified error types
//! - Layered application configuration

pub mod config;
pub mod error;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use store::{CacheStore, CachedResponse};
