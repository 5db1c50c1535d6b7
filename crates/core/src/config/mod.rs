//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FROST_*)
//! 2. TOML config file (if FROST_CONFIG_FILE set)
//! 3. Built-in defaults (the build-time resource manifest)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Local application files that must be present for offline operation.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.json",
    "./css/style.css",
    "./js/app.js",
    "./js/api.js",
    "./js/charts.js",
    "./js/notifications.js",
    "./js/firebase-config.js",
    "./js/pdf-export.js",
    "./js/onboarding.js",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

/// Third-party libraries pinned by exact URL.
pub const DEFAULT_EXTERNAL_ASSETS: &[&str] = &[
    "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js",
    "https://www.gstatic.com/firebasejs/10.7.1/firebase-app-compat.js",
    "https://www.gstatic.com/firebasejs/10.7.1/firebase-messaging-compat.js",
];

/// CDN and push-messaging hosts whose responses may be cached.
pub const DEFAULT_TRUSTED_HOSTS: &[&str] = &["cdn.jsdelivr.net", "cdnjs.cloudflare.com", "gstatic.com"];

/// Analytics and tracking hosts that are never cached.
pub const DEFAULT_DENIED_HOSTS: &[&str] = &["google-analytics.com", "googletagmanager.com", "doubleclick.net"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FROST_*)
/// 2. TOML config file (if FROST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite generation store.
    ///
    /// Set via FROST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Version label of the current generation.
    ///
    /// Changing it forces a fresh generation on the next install and marks
    /// every other generation stale at the next activation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin and base path of the hosted application.
    ///
    /// Relative manifest entries resolve against it, and it defines
    /// what counts as same-origin.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Application files fetched at install, relative to `scope`.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Whitelisted third-party URLs fetched at install.
    #[serde(default = "default_external_assets")]
    pub external_assets: Vec<String>,

    /// Cross-origin hosts (and their subdomains) admitted for runtime caching.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Hosts (and their subdomains) that are never cached.
    #[serde(default = "default_denied_hosts")]
    pub denied_hosts: Vec<String>,

    /// Document served when a navigation request cannot reach the network.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FROST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FROST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FROST_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Attempts per stale generation before activation gives up on it.
    #[serde(default = "default_max_delete_attempts")]
    pub max_delete_attempts: u32,

    /// Dispatch install and activate when the host starts.
    #[serde(default = "default_true")]
    pub install_on_start: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./frost-cache.sqlite")
}

fn default_cache_name() -> String {
    "fridge-monitor-v1.0.0".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_static_assets() -> Vec<String> {
    to_strings(DEFAULT_STATIC_ASSETS)
}

fn default_external_assets() -> Vec<String> {
    to_strings(DEFAULT_EXTERNAL_ASSETS)
}

fn default_trusted_hosts() -> Vec<String> {
    to_strings(DEFAULT_TRUSTED_HOSTS)
}

fn default_denied_hosts() -> Vec<String> {
    to_strings(DEFAULT_DENIED_HOSTS)
}

fn default_entry_point() -> String {
    "./index.html".into()
}

fn default_user_agent() -> String {
    "frost-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_delete_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_name: default_cache_name(),
            scope: default_scope(),
            static_assets: default_static_assets(),
            external_assets: default_external_assets(),
            trusted_hosts: default_trusted_hosts(),
            denied_hosts: default_denied_hosts(),
            entry_point: default_entry_point(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_delete_attempts: default_max_delete_attempts(),
            install_on_start: true,
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
    /// 1. Environment variables prefixed with `FROST_`
    /// 2. TOML file from `FROST_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("FROST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FROST_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed application scope.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `scope` is not an absolute http(s) URL.
    pub fn scope_url(&self) -> Result<url::Url, ConfigError> {
        let scope = url::Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })?;
        match scope.scheme() {
            "http" | "https" => Ok(scope),
            other => Err(ConfigError::Invalid { field: "scope".into(), reason: format!("unsupported scheme: {other}") }),
        }
    }
}
