//! Versioned, multi-generation response cache.
//!
//! Generations are independent request → snapshot namespaces kept in one
//! SQLite database accessed through tokio-rusqlite:
//!
//! - Keys derived from method + URL, with `Vary` checked on lookup
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-generation deletion for version sweeps

pub mod connection;
pub mod generation;
pub mod hash;
pub mod migrations;
pub mod snapshots;

pub use crate::Error;

pub use connection::CacheDb;
pub use generation::{CacheStore, Generation, GenerationNames};
pub use hash::RequestKey;
pub use snapshots::Snapshot;
