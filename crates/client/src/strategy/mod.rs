//! Caching strategies.
//!
//! Each executor takes a request and an opened generation and produces a
//! response. Network failures never escape an executor: they become a cache
//! fallback or the offline response. Store failures are logged and dropped.

pub mod cache_first;
pub mod classify;
pub mod network_first;
pub mod stale_while_revalidate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use offgrid_core::{Error, Generation, Request, Response};

pub use classify::PatternTable;

/// How a request is satisfied from cache vs. network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyLabel {
    CacheFirst,
    StaleWhileRevalidate,
    NetworkFirst,
}

/// Used by the classifier when no pattern matches and by the dispatcher
/// for labels it does not recognize.
pub const DEFAULT_STRATEGY: StrategyLabel = StrategyLabel::StaleWhileRevalidate;

impl StrategyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyLabel::CacheFirst => "cache-first",
            StrategyLabel::StaleWhileRevalidate => "stale-while-revalidate",
            StrategyLabel::NetworkFirst => "network-first",
        }
    }

    /// Parse a label, falling back to [`DEFAULT_STRATEGY`].
    pub fn parse_or_default(label: &str) -> Self {
        label.parse().unwrap_or(DEFAULT_STRATEGY)
    }
}

impl fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "cache-first" => Ok(StrategyLabel::CacheFirst),
            "stale-while-revalidate" => Ok(StrategyLabel::StaleWhileRevalidate),
            "network-first" => Ok(StrategyLabel::NetworkFirst),
            other => Err(Error::InvalidInput(format!("unknown strategy: {other}"))),
        }
    }
}

/// Look `request` up in `generation`. Read failures count as a miss.
pub(crate) async fn cached(generation: &Generation, request: &Request) -> Option<Response> {
    let snapshot = match generation.lookup(request).await {
        Ok(found) => found?,
        Err(e) => {
            tracing::warn!(generation = generation.name(), url = %request.url, error = %e, "cache read failed");
            return None;
        }
    };

    match snapshot.into_response() {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(generation = generation.name(), url = %request.url, error = %e, "stored snapshot unreadable");
            None
        }
    }
}

/// Store a copy of a 2xx `response`. Anything else is never cached.
///
/// Completes before returning, but a failed write only logs: the caller
/// already holds the real response.
pub(crate) async fn store_if_success(generation: &Generation, request: &Request, response: &Response) {
    if !response.is_success() {
        tracing::debug!(url = %request.url, status = response.status, "not caching non-success response");
        return;
    }

    if let Err(e) = generation.put(request, response).await {
        tracing::warn!(generation = generation.name(), url = %request.url, error = %e, "cache write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_strings() {
        for label in [StrategyLabel::CacheFirst, StrategyLabel::StaleWhileRevalidate, StrategyLabel::NetworkFirst] {
            assert_eq!(label.as_str().parse::<StrategyLabel>().unwrap(), label);
        }
    }

    #[test]
    fn test_label_parse_accepts_snake_case() {
        assert_eq!("NETWORK_FIRST".parse::<StrategyLabel>().unwrap(), StrategyLabel::NetworkFirst);
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(StrategyLabel::parse_or_default("cache-first"), StrategyLabel::CacheFirst);
        assert_eq!(StrategyLabel::parse_or_default("cache-only"), DEFAULT_STRATEGY);
        assert_eq!(StrategyLabel::parse_or_default(""), DEFAULT_STRATEGY);
    }

    #[test]
    fn test_label_serde() {
        let json = serde_json::to_string(&StrategyLabel::StaleWhileRevalidate).unwrap();
        assert_eq!(json, "\"stale-while-revalidate\"");
    }
}
