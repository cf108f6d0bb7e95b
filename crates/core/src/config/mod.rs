//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWPROXY_*)
//! 2. TOML config file (if SWPROXY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::{DEFAULT_PRECACHE, ExclusionRule, NotificationConfig, WorkerConfig};

mod validation;

pub use validation::ConfigError;

/// Backend for the cache store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWPROXY_*)
/// 2. TOML config file (if SWPROXY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation. Bump it to invalidate every entry.
    ///
    /// Set via SWPROXY_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin and base path of the application.
    ///
    /// Set via SWPROXY_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Paths fetched and stored at install time, resolved against `scope`.
    ///
    /// Set via SWPROXY_PRECACHE_URLS environment variable (`["/", "/app.js"]`).
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// URL substring that routes requests network-first and keeps them out of the cache.
    ///
    /// Set via SWPROXY_EXCLUDE_PATTERN environment variable.
    #[serde(default = "default_exclude_pattern")]
    pub exclude_pattern: String,

    /// Regular expression used instead of `exclude_pattern` when set.
    ///
    /// Set via SWPROXY_EXCLUDE_REGEX environment variable.
    #[serde(default)]
    pub exclude_regex: Option<String>,

    /// Cache store backend.
    ///
    /// Set via SWPROXY_STORE environment variable (`sqlite` or `memory`).
    #[serde(default)]
    pub store: StoreKind,

    /// Path to SQLite cache database.
    ///
    /// Set via SWPROXY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWPROXY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWPROXY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SWPROXY_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects to follow.
    ///
    /// Set via SWPROXY_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Push notification assets and action titles.
    ///
    /// Set via SWPROXY_NOTIFICATION__* environment variables.
    #[serde(default)]
    pub notification: NotificationConfig,
}

fn default_cache_name() -> String {
    "swproxy-v1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_precache_urls() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_pattern() -> String {
    "/album/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swproxy-cache.sqlite")
}

fn default_user_agent() -> String {
    "swproxy/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            scope: default_scope(),
            precache_urls: default_precache_urls(),
            exclude_pattern: default_exclude_pattern(),
            exclude_regex: None,
            store: StoreKind::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            notification: NotificationConfig::default(),
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
    /// 1. Environment variables prefixed with `SWPROXY_`
    /// 2. TOML file from `SWPROXY_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SWPROXY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWPROXY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed scope URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `scope` is not an absolute http(s) URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "scope".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Exclusion rule built from `exclude_regex` or `exclude_pattern`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `exclude_regex` does not compile.
    pub fn exclusion_rule(&self) -> Result<ExclusionRule, ConfigError> {
        match &self.exclude_regex {
            Some(pattern) => Regex::new(pattern)
                .map(ExclusionRule::Pattern)
                .map_err(|e| ConfigError::Invalid { field: "exclude_regex".into(), reason: e.to_string() }),
            None => Ok(ExclusionRule::Contains(self.exclude_pattern.clone())),
        }
    }

    /// Policy inputs for the worker.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope or exclusion rule is invalid.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        Ok(WorkerConfig {
            cache_name: self.cache_name.clone(),
            scope: self.scope_url()?,
            precache_urls: self.precache_urls.clone(),
            exclusion: self.exclusion_rule()?,
            notification: self.notification.clone(),
        })
    }
}
