//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - The request/response model
//! - Cache generations with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CacheStore, Generation, GenerationNames, RequestKey, Snapshot};
pub use config::AppConfig;
pub use error::Error;
pub use message::{Headers, Request, Response, ResponseSource};
