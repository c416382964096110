//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// URL patterns per caching strategy, as regular expressions.
///
/// Groups are evaluated in field order; the first group with a matching
/// pattern decides the strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPatterns {
    #[serde(default)]
    pub cache_first: Vec<String>,
    #[serde(default)]
    pub stale_while_revalidate: Vec<String>,
    #[serde(default)]
    pub network_first: Vec<String>,
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

impl Default for StrategyPatterns {
    fn default() -> Self {
        Self {
            cache_first: owned(&[
                r"\.(css|js|woff2?|ttf|eot)$",
                r"/static/",
                r"fonts\.googleapis\.com",
                r"fonts\.gstatic\.com",
            ]),
            stale_while_revalidate: owned(&[r"/api/", r"\.(?:png|jpg|jpeg|svg|gif|webp)$"]),
            network_first: owned(&[r"/contact", r"/testimonials", r"/blog"]),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via OFFGRID_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OFFGRID_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via OFFGRID_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via OFFGRID_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Prefix shared by every generation name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Cache version. Changing it makes every older generation stale.
    ///
    /// Set via OFFGRID_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin that pinned asset paths are resolved against.
    #[serde(default)]
    pub origin: Option<String>,

    /// Asset paths pinned into the static generation at startup.
    #[serde(default)]
    pub precache: Vec<String>,

    /// Strategy pattern table.
    #[serde(default)]
    pub strategies: StrategyPatterns,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_cache_prefix() -> String {
    "offgrid".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            origin: None,
            precache: Vec::new(),
            strategies: StrategyPatterns::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFGRID_`
    /// 2. TOML file from `OFFGRID_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFGRID_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Pinned asset URLs, resolved against `origin`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if assets are listed without an origin,
    /// or `ConfigError::Invalid` if a path cannot be joined onto it.
    pub fn precache_urls(&self) -> Result<Vec<url::Url>, ConfigError> {
        if self.precache.is_empty() {
            return Ok(Vec::new());
        }
        let origin = self.origin_url()?.ok_or_else(|| ConfigError::Missing {
            field: "origin".into(),
            hint: "Set OFFGRID_ORIGIN when precache assets are configured".into(),
        })?;
        self.precache
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: format!("{path}: {e}") })
            })
            .collect()
    }

    fn origin_url(&self) -> Result<Option<url::Url>, ConfigError> {
        self.origin
            .as_deref()
            .map(|origin| {
                url::Url::parse(origin)
                    .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
            })
            .transpose()
    }
}
