//! Request and response model shared by the store, the fetcher and the dispatcher.
//!
//! Header names are stored lowercased so lookups and `Vary` comparisons
//! do not depend on the casing a caller happened to use.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Status of the synthetic offline response.
pub const OFFLINE_STATUS: u16 = 503;

/// Body of the synthetic offline response.
pub const OFFLINE_BODY: &str = "Offline";

/// Lowercased header map.
pub type Headers = BTreeMap<String, String>;

/// An inbound resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Headers,
}

impl Request {
    /// Build a request for an already-parsed URL. The fragment is dropped.
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url, headers: Headers::new() }
    }

    /// Build a `GET` request for an already-parsed URL.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parse `url` and build a `GET` request for it.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::get(url))
    }

    /// Add a header, lowercasing the name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Where a response came from. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Live response from the network
    Network,
    /// Stored snapshot from a cache generation
    Cache,
    /// Synthetic fallback, neither cache nor network could answer
    Offline,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
        }
    }
}

/// A response as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    /// Build a network response.
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into(), source: ResponseSource::Network }
    }

    /// The universal fallback: `503 Offline`.
    pub fn offline() -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".into(), "text/plain;charset=UTF-8".into());
        Self {
            status: OFFLINE_STATUS,
            headers,
            body: Bytes::from_static(OFFLINE_BODY.as_bytes()),
            source: ResponseSource::Offline,
        }
    }

    /// True for 2xx statuses. Only these are ever stored.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn is_offline(&self) -> bool {
        self.source == ResponseSource::Offline
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Header names listed in `Vary`, lowercased.
    pub fn vary(&self) -> Vec<String> {
        self.header("vary")
            .map(|v| {
                v.split(',')
                    .map(|h| h.trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
