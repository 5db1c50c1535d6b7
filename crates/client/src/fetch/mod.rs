//! Network transport and request/response types.
//!
//! ### Requests
//! - Any scheme parses, so the admission policy can refuse it explicitly
//! - Fragments are removed; the method and URL form the store key
//!
//! ### Transport
//! - [`Transport`] is the "fetch resource by request" capability
//! - [`FetchClient`] implements it over reqwest, with no retries
//! - HTTP error statuses are responses, not failures; only transport-level
//!   problems (connect, timeout, oversized body) are errors
//!
//! ### Admission
//! - See [`admission`] for the caching policy

pub mod admission;
pub mod url;

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, Url, header};
use serde::{Deserialize, Serialize};

pub use admission::{AdmissionError, AdmissionPolicy, DENIED_SCHEMES};
pub use self::url::{UrlError, canonicalize, resolve};

use frost_core::{AppConfig, Error, StoredResponse};

/// What the requester intends to do with the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// `fetch()`/XHR and anything without a more specific destination.
    #[default]
    Empty,
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Destination::Document),
            "script" => Ok(Destination::Script),
            "style" => Ok(Destination::Style),
            "image" => Ok(Destination::Image),
            "font" => Ok(Destination::Font),
            "manifest" => Ok(Destination::Manifest),
            "" | "empty" => Ok(Destination::Empty),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// Response classification, mirroring how the response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response.
    Cors,
    /// Cross-origin response without readable metadata.
    Opaque,
    /// Synthetic network-error response.
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }

    fn from_stored(value: &str) -> Self {
        match value {
            "basic" => ResponseType::Basic,
            "cors" => ResponseType::Cors,
            "opaque" => ResponseType::Opaque,
            _ => ResponseType::Error,
        }
    }
}

/// An intercepted outbound resource request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub destination: Destination,
}

impl Request {
    /// Build a request from untyped host input.
    pub fn parse(method: &str, url: &str, destination: Destination) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {method}")))?;
        let url = match canonicalize(url) {
            Ok(url) => url,
            // Non-http schemes are kept so the admission policy can refuse them.
            Err(UrlError::UnsupportedScheme(_)) => Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(e.to_string()))?,
            Err(e) => return Err(Error::InvalidUrl(e.to_string())),
        };
        Ok(Self { url, method, destination })
    }

    /// A plain GET with no particular destination.
    pub fn get(url: Url) -> Self {
        Self { url, method: Method::GET, destination: Destination::Empty }
    }
}

/// A response as delivered to the requester or read back from the store.
#[derive(Debug, Clone)]
pub struct Response {
    /// URL the response was produced for (after redirects when fetched).
    pub url: Url,
    pub status: StatusCode,
    pub response_type: ResponseType,
    pub headers: header::HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Status is exactly 200 and the response is not an error response.
    pub fn is_storable(&self) -> bool {
        self.status == StatusCode::OK && self.response_type != ResponseType::Error
    }

    /// Copy this response into its persisted form, keyed by `request`.
    ///
    /// The body is copied, so the returned value and `self` can be consumed
    /// independently.
    pub fn to_stored(&self, request: &Request) -> StoredResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        StoredResponse {
            url: request.url.to_string(),
            method: request.method.as_str().to_string(),
            status: self.status.as_u16(),
            response_type: self.response_type.as_str().to_string(),
            headers,
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a response from its persisted form.
    pub fn from_stored(stored: StoredResponse) -> Result<Self, Error> {
        let url = Url::parse(&stored.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let status = StatusCode::from_u16(stored.status)
            .map_err(|_| Error::InvalidInput(format!("stored status {} for {}", stored.status, stored.url)))?;

        let mut headers = header::HeaderMap::new();
        for (name, value) in &stored.headers {
            match (header::HeaderName::from_bytes(name.as_bytes()), header::HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!("skipping unreadable stored header {} for {}", name, stored.url),
            }
        }

        Ok(Self {
            url,
            status,
            response_type: ResponseType::from_stored(&stored.response_type),
            headers,
            body: Bytes::from(stored.body),
        })
    }
}

/// The "fetch resource by request" capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request to the network.
    ///
    /// Resolves with any HTTP response, or fails when no response arrived.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "frost-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Application scope; responses from its origin are `basic`, others `cors`.
    pub scope: Option<Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "frost-sw/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            scope: None,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            scope: config.scope_url().ok(),
            ..Default::default()
        }
    }
}

/// HTTP transport backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn classify(&self, final_url: &Url) -> ResponseType {
        match &self.config.scope {
            Some(scope) if scope.origin() != final_url.origin() => ResponseType::Cors,
            _ => ResponseType::Basic,
        }
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{}: {}", request.url, e))
                } else {
                    Error::NetworkFailure(format!("{}: {}", request.url, e))
                }
            })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailure(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                body.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} {} -> {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        let response_type = self.classify(&final_url);
        Ok(Response { url: final_url, status, response_type, headers, body })
    }
}
