//! URL admission policy.
//!
//! Decides whether a request URL may be served from and written to the
//! cache. The decision is a pure function of the URL and the configured
//! application scope and host lists.

use url::Url;

/// Schemes that are never cached.
pub const DENIED_SCHEMES: &[&str] = &[
    "chrome-extension",
    "chrome",
    "about",
    "data",
    "blob",
    "javascript",
    "moz-extension",
];

/// Reason a URL was refused by the admission policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("blocked scheme: {0}")]
    BlockedScheme(String),

    #[error("opaque origin")]
    OpaqueOrigin,

    #[error("denied host: {0}")]
    DeniedHost(String),

    #[error("untrusted cross-origin host: {0}")]
    Untrusted(String),
}

/// Admission policy for runtime caching.
///
/// Checks, in order:
/// - Scheme is not in [`DENIED_SCHEMES`] and the origin is not opaque
/// - Host is not a denied analytics/tracking host (or a subdomain of one)
/// - Same-origin URLs are admitted
/// - Cross-origin URLs are admitted if they start with a whitelisted external
///   asset, or their host is a trusted host (or a subdomain of one)
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    scope: Url,
    external_assets: Vec<String>,
    trusted_hosts: Vec<String>,
    denied_hosts: Vec<String>,
}

impl AdmissionPolicy {
    /// Build a policy for the application served under `scope`.
    pub fn new(scope: Url, external_assets: &[String], trusted_hosts: &[String], denied_hosts: &[String]) -> Self {
        let external_assets = external_assets
            .iter()
            .map(|asset| Url::parse(asset.trim()).map(String::from).unwrap_or_else(|_| asset.trim().to_string()))
            .collect();
        let lower = |hosts: &[String]| hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect::<Vec<_>>();

        Self { scope, external_assets, trusted_hosts: lower(trusted_hosts), denied_hosts: lower(denied_hosts) }
    }

    /// Build a policy from application configuration.
    pub fn from_config(config: &frost_core::AppConfig) -> Result<Self, frost_core::Error> {
        let scope = config
            .scope_url()
            .map_err(|e| frost_core::Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(scope, &config.external_assets, &config.trusted_hosts, &config.denied_hosts))
    }

    /// Check a URL, returning the reason it was refused.
    pub fn check(&self, url: &str) -> Result<(), AdmissionError> {
        let parsed = Url::parse(url).map_err(|e| AdmissionError::InvalidUrl(e.to_string()))?;

        let scheme = parsed.scheme();
        if DENIED_SCHEMES.contains(&scheme) {
            return Err(AdmissionError::BlockedScheme(scheme.to_string()));
        }

        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(AdmissionError::OpaqueOrigin);
        }

        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        if self.denied_hosts.iter().any(|denied| host_matches(&host, denied)) {
            return Err(AdmissionError::DeniedHost(host));
        }

        if origin == self.scope.origin() {
            return Ok(());
        }

        if self
            .external_assets
            .iter()
            .any(|asset| parsed.as_str().starts_with(asset.as_str()))
        {
            return Ok(());
        }

        if self.trusted_hosts.iter().any(|trusted| host_matches(&host, trusted)) {
            return Ok(());
        }

        Err(AdmissionError::Untrusted(host))
    }

    /// Whether a URL's response may be cached.
    ///
    /// Unparsable URLs are logged and refused.
    pub fn is_cacheable(&self, url: &str) -> bool {
        match self.check(url) {
            Ok(()) => true,
            Err(AdmissionError::InvalidUrl(reason)) => {
                tracing::warn!("invalid URL {}: {}", url, reason);
                false
            }
            Err(_) => false,
        }
    }
}

/// Host equals `pattern` or is a subdomain of it.
fn host_matches(host: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frost_core::config::{DEFAULT_DENIED_HOSTS, DEFAULT_EXTERNAL_ASSETS, DEFAULT_TRUSTED_HOSTS};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn policy() -> AdmissionPolicy {
        AdmissionPolicy::new(
            Url::parse("https://example.com/").unwrap(),
            &strings(DEFAULT_EXTERNAL_ASSETS),
            &strings(DEFAULT_TRUSTED_HOSTS),
            &strings(DEFAULT_DENIED_HOSTS),
        )
    }

    #[test]
    fn test_extension_scheme_not_cacheable() {
        assert!(!policy().is_cacheable("chrome-extension://x/y"));
        assert_eq!(
            policy().check("chrome-extension://x/y"),
            Err(AdmissionError::BlockedScheme("chrome-extension".into()))
        );
    }

    #[test]
    fn test_same_origin_cacheable() {
        assert!(policy().is_cacheable("https://example.com/script.js"));
    }

    #[test]
    fn test_analytics_not_cacheable() {
        assert!(!policy().is_cacheable("https://www.google-analytics.com/collect"));
        assert!(!policy().is_cacheable("https://www.googletagmanager.com/gtag/js?id=G-1"));
        assert!(!policy().is_cacheable("https://stats.g.doubleclick.net/j/collect"));
    }

    #[test]
    fn test_whitelisted_external_asset_cacheable() {
        assert!(policy().is_cacheable("https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js"));
    }

    #[test]
    fn test_unknown_cross_origin_not_cacheable() {
        assert!(!policy().is_cacheable("https://random-other-cdn.example/lib.js"));
        assert_eq!(
            policy().check("https://random-other-cdn.example/lib.js"),
            Err(AdmissionError::Untrusted("random-other-cdn.example".into()))
        );
    }

    #[test]
    fn test_trusted_host_subdomain_cacheable() {
        assert!(policy().is_cacheable("https://fonts.gstatic.com/s/roboto/v30/font.woff2"));
    }

    #[test]
    fn test_lookalike_host_not_trusted() {
        assert!(!policy().is_cacheable("https://evilgstatic.com/lib.js"));
    }

    #[test]
    fn test_live_api_not_cacheable() {
        assert!(!policy().is_cacheable("https://script.google.com/macros/s/abc/exec?action=get_devices"));
    }

    #[test]
    fn test_other_port_is_cross_origin() {
        assert!(!policy().is_cacheable("https://example.com:8443/script.js"));
    }

    #[test]
    fn test_data_and_blob_not_cacheable() {
        assert!(!policy().is_cacheable("data:text/plain,hello"));
        assert!(!policy().is_cacheable("blob:https://example.com/0b5c-11"));
        assert!(!policy().is_cacheable("about:blank"));
    }

    #[test]
    fn test_opaque_origin_not_cacheable() {
        assert_eq!(policy().check("file:///etc/hosts"), Err(AdmissionError::OpaqueOrigin));
    }

    #[test]
    fn test_invalid_url_not_cacheable() {
        assert!(!policy().is_cacheable("not a url"));
        assert!(matches!(policy().check("not a url"), Err(AdmissionError::InvalidUrl(_))));
    }

    #[test]
    fn test_denylist_beats_same_origin() {
        let policy = AdmissionPolicy::new(
            Url::parse("https://www.google-analytics.com/").unwrap(),
            &[],
            &[],
            &strings(DEFAULT_DENIED_HOSTS),
        );
        assert!(!policy.is_cacheable("https://www.google-analytics.com/collect"));
    }

    #[test]
    fn test_host_matches() {
        assert!(host_matches("gstatic.com", "gstatic.com"));
        assert!(host_matches("www.gstatic.com", "gstatic.com"));
        assert!(!host_matches("notgstatic.com", "gstatic.com"));
        assert!(!host_matches("gstatic.com", ""));
    }
}
