//! Offline resource cache.
//!
//! The hosting runtime drives a [`ServiceWorker`] through three entry points:
//!
//! - [`ServiceWorker::install`] fetches the manifest and commits it as one
//!   generation, all or nothing.
//! - [`ServiceWorker::activate`] deletes every other generation and claims
//!   open sessions.
//! - [`ServiceWorker::handle_request`] serves intercepted requests
//!   cache-first, falling back to the network, and to the entry point
//!   document for failed navigations.
//!
//! The worker only writes the generation named by its own version label.
//! Reads come from that generation once it is installed; before that, the
//! most recently activated generation keeps serving. Every entry point takes
//! `&self` and may run concurrently.

mod activate;
mod install;
mod respond;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{AdmissionPolicy, Response, Transport, resolve};
use frost_core::{AppConfig, CacheDb, Error};

pub use activate::ActivateReport;
pub use install::InstallReport;

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker never became usable.
    Redundant,
}

/// Where a response handed back to the requester came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Entry point document served for a failed navigation.
    Fallback,
}

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    /// Not a GET request.
    Method,
    /// Refused by the admission policy.
    NotAdmitted,
}

/// Outcome of an intercepted request.
#[derive(Debug)]
pub enum Disposition {
    Responded { response: Response, source: ResponseSource },
    Passthrough(PassthroughReason),
}

/// Fixed per-deployment settings of a worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Version label of the generation this worker owns.
    pub version: String,
    /// Resolved manifest: static assets followed by external assets.
    pub manifest: Vec<Url>,
    /// Document served when a navigation cannot reach the network.
    pub entry_point: Url,
    /// Attempts per stale generation during activation.
    pub max_delete_attempts: u32,
}

impl WorkerConfig {
    /// Resolve the manifest and entry point from application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = config
            .scope_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let manifest = config
            .static_assets
            .iter()
            .chain(config.external_assets.iter())
            .map(|entry| resolve(&scope, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let entry_point =
            resolve(&scope, &config.entry_point).map_err(|e| Error::InvalidUrl(format!("entry_point: {e}")))?;

        Ok(Self {
            version: config.cache_name.clone(),
            manifest,
            entry_point,
            max_delete_attempts: config.max_delete_attempts.max(1),
        })
    }
}

/// The offline resource cache component.
pub struct ServiceWorker<T> {
    config: WorkerConfig,
    policy: Arc<AdmissionPolicy>,
    db: CacheDb,
    transport: Arc<T>,
    state: RwLock<WorkerState>,
    pending: Mutex<JoinSet<()>>,
}

impl<T: Transport> ServiceWorker<T> {
    /// Create a worker for one version label.
    pub fn new(config: WorkerConfig, policy: AdmissionPolicy, db: CacheDb, transport: Arc<T>) -> Self {
        Self {
            config,
            policy: Arc::new(policy),
            db,
            transport,
            state: RwLock::new(WorkerState::Parsed),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Create a worker from application configuration.
    pub fn from_app_config(config: &AppConfig, db: CacheDb, transport: Arc<T>) -> Result<Self, Error> {
        let worker_config = WorkerConfig::from_app_config(config)?;
        let policy = AdmissionPolicy::from_config(config)?;
        Ok(Self::new(worker_config, policy, db, transport))
    }

    /// Version label of the generation this worker owns.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Set the lifecycle state, returning the previous one.
    async fn transition(&self, next: WorkerState) -> WorkerState {
        let mut state = self.state.write().await;
        let previous = *state;
        *state = next;
        tracing::debug!(version = %self.config.version, from = ?previous, to = ?next, "worker state");
        previous
    }

    /// Wait for every opportunistic cache write started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!("cache write task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::mock::{MockTransport, test_config};

    #[tokio::test]
    async fn test_worker_config_resolves_manifest() {
        let config = WorkerConfig::from_app_config(&AppConfig::default()).unwrap();
        assert_eq!(config.version, "fridge-monitor-v1.0.0");
        assert_eq!(config.manifest.len(), 17);
        assert_eq!(config.manifest[0].as_str(), "http://localhost:8080/");
        assert_eq!(config.manifest[1].as_str(), "http://localhost:8080/index.html");
        assert_eq!(
            config.manifest[13].as_str(),
            "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js"
        );
        assert_eq!(config.entry_point.as_str(), "http://localhost:8080/index.html");
    }

    #[tokio::test]
    async fn test_worker_config_rejects_bad_entry() {
        let app = AppConfig { static_assets: vec!["ftp://files.example/app.js".into()], ..Default::default() };
        assert!(matches!(WorkerConfig::from_app_config(&app), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_new_worker_is_parsed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let worker = ServiceWorker::from_app_config(&test_config("v1"), db, Arc::new(MockTransport::new())).unwrap();
        assert_eq!(worker.version(), "v1");
        assert_eq!(worker.state().await, WorkerState::Parsed);
    }
}
