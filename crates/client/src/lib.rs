//! Request-interception caching engine for offgrid.
//!
//! This crate provides the network fetcher, the strategy classifier and
//! executors, the request dispatcher and the generation lifecycle shared
//! by the server.

pub mod dispatch;
pub mod fetch;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use dispatch::Dispatcher;
pub use fetch::{FetchClient, FetchConfig, Fetcher, canonicalize};
pub use lifecycle::GenerationManager;
pub use strategy::{DEFAULT_STRATEGY, PatternTable, StrategyLabel};
