//! Request handling: cache-first with network fallback.

use reqwest::Method;
use url::Url;

use super::{Disposition, PassthroughReason, ResponseSource, ServiceWorker};
use crate::fetch::{Destination, Request, Response, Transport};
use frost_core::Error;

impl<T: Transport> ServiceWorker<T> {
    /// Serve an intercepted request.
    ///
    /// Decision order:
    /// 1. Non-GET requests and URLs refused by the admission policy pass
    ///    through untouched.
    /// 2. A stored entry in the serving generation (or, failing that, this
    ///    worker's own) is returned without touching the network.
    /// 3. Otherwise the network answers. A 200 non-error response is copied
    ///    into this worker's own generation in the background; the caller
    ///    never waits on it.
    /// 4. If the network fails for a document request, the stored entry
    ///    point document is served instead.
    ///
    /// # Errors
    ///
    /// Propagates the network failure when no fallback applies.
    pub async fn handle_request(&self, request: &Request) -> Result<Disposition, Error> {
        if request.method != Method::GET {
            return Ok(Disposition::Passthrough(PassthroughReason::Method));
        }

        if !self.policy.is_cacheable(request.url.as_str()) {
            return Ok(Disposition::Passthrough(PassthroughReason::NotAdmitted));
        }

        let serving = self.serving_version().await;

        if let Some(response) = self.cached(&serving, &request.url).await {
            tracing::debug!("cache hit for {}", request.url);
            return Ok(Disposition::Responded { response, source: ResponseSource::Cache });
        }
        tracing::debug!("cache miss for {}", request.url);

        match self.transport.fetch(request).await {
            Ok(response) => {
                if response.is_storable() {
                    self.store_in_background(request, &response).await;
                }
                Ok(Disposition::Responded { response, source: ResponseSource::Network })
            }
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "fetch failed");

                if request.destination == Destination::Document
                    && e.is_network()
                    && let Some(response) = self.cached(&serving, &self.config.entry_point).await
                {
                    tracing::info!("serving {} for {}", self.config.entry_point, request.url);
                    return Ok(Disposition::Responded { response, source: ResponseSource::Fallback });
                }

                Err(e)
            }
        }
    }

    /// Version label of the generation that answers requests.
    ///
    /// This worker's own generation once its install has committed. Until
    /// then the most recently activated generation keeps serving, so a failed
    /// upgrade leaves the previous cache in effect. With neither, the worker's
    /// own (possibly empty) generation is used.
    pub async fn serving_version(&self) -> String {
        let own = &self.config.version;
        let current = match self.db.is_generation_ready(own).await {
            Ok(true) => return own.clone(),
            Ok(false) => self.db.current_generation().await,
            Err(e) => Err(e),
        };

        match current {
            Ok(Some(version)) => version,
            Ok(None) => own.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "could not resolve serving generation");
                own.clone()
            }
        }
    }

    /// Read a GET entry from the serving generation, then from this worker's own.
    async fn cached(&self, serving: &str, url: &Url) -> Option<Response> {
        if let Some(response) = self.lookup(serving, url).await {
            return Some(response);
        }
        if serving != self.config.version {
            return self.lookup(&self.config.version, url).await;
        }
        None
    }

    /// Read a GET entry from `version`.
    ///
    /// Store errors count as a miss; the request then goes to the network.
    async fn lookup(&self, version: &str, url: &Url) -> Option<Response> {
        let stored = match self.db.get_entry(version, Method::GET.as_str(), url.as_str()).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "cache lookup failed");
                return None;
            }
        };

        match Response::from_stored(stored) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Write a copy of `response` to this worker's generation without
    /// delaying the caller.
    ///
    /// Write failures are logged and dropped.
    async fn store_in_background(&self, request: &Request, response: &Response) {
        let stored = response.to_stored(request);
        let db = self.db.clone();
        let policy = self.policy.clone();
        let version = self.config.version.clone();

        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            if !policy.is_cacheable(&stored.url) {
                return;
            }
            if let Err(e) = db.put_entry(&version, &stored).await {
                tracing::warn!("cache put failed for {}: {}", stored.url, e);
            }
        });
    }
}
