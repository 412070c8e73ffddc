//! Client-side offline machinery for the Tablemate gateway.
//!
//! This crate provides the fetch strategies, the cache lifecycle
//! manager, request deduplication and the in-memory query cache, all
//! composed by [`Gateway`].

pub mod dedup;
pub mod fetch;
pub mod gateway;
pub mod lifecycle;
pub mod query;
pub mod strategy;
pub mod ttl;

pub use dedup::Deduplicator;
pub use fetch::{Destination, FetchConfig, Fetcher, GatewayRequest, GatewayResponse, NetworkClient, ServedFrom};
pub use gateway::Gateway;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use query::QueryCache;
pub use strategy::{BoundedNetworkFirst, CacheFirst, NetworkFirst, RevalidateHook, Route, StrategySelector};
pub use ttl::TtlCache;
