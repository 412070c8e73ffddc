//! SQLite-backed partitioned response cache.
//!
//! This module provides the durable half of the offline gateway: named
//! cache partitions holding response snapshots, with async access via
//! tokio-rusqlite. It supports:
//!
//! - Named partitions (static shell assets, dynamic runtime responses)
//! - Version-tagged partition names; bumping the version is the only
//!   invalidation lever, there is no per-entry expiry
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheStore;
pub use entries::CachedResponse;
