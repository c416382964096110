//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and sweeping cache generations.

pub mod generations;
pub mod get;
pub mod sweep;

pub use generations::generations_impl;
pub use get::{CacheGetParams, get_impl};
pub use sweep::sweep_impl;
