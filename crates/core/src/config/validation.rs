//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` is empty
    /// - `scope` is not an absolute http(s) URL
    /// - `static_assets` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `max_delete_attempts` is 0 or exceeds 10
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }

        self.scope_url()?;

        if self.static_assets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "static_assets".into(),
                reason: "must list at least one resource".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_delete_attempts == 0 || self.max_delete_attempts > 10 {
            return Err(ConfigError::Invalid {
                field: "max_delete_attempts".into(),
                reason: "must be between 1 and 10".into(),
            });
        }

        let overlap: Vec<&String> = self
            .trusted_hosts
            .iter()
            .filter(|host| self.denied_hosts.iter().any(|denied| denied.eq_ignore_ascii_case(host)))
            .collect();
        if !overlap.is_empty() {
            tracing::warn!(
                hosts = ?overlap,
                "hosts listed in both trusted_hosts and denied_hosts; denylist takes precedence"
            );
        }

        Ok(())
    }
}
