//! Install: fetch the manifest and commit it as one generation.

use serde::Serialize;

use super::{ServiceWorker, WorkerState};
use crate::fetch::{Request, Transport};
use frost_core::Error;

/// Result of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    /// Number of manifest entries committed.
    pub entries: u64,
    /// The generation may activate without waiting for open sessions to end.
    pub skip_waiting: bool,
}

impl<T: Transport> ServiceWorker<T> {
    /// Fetch every manifest URL and commit the responses as this worker's generation.
    ///
    /// Responses are staged in memory and written in one transaction, so a
    /// failed fetch, a failed write, or an abandoned install leaves the store
    /// exactly as it was. Re-installing the same version overwrites entries
    /// in place.
    ///
    /// # Errors
    ///
    /// - `ManifestFetchFailed` if any manifest URL fails or answers non-2xx
    /// - `StoreWriteFailed` if the commit fails
    pub async fn install(&self) -> Result<InstallReport, Error> {
        tracing::info!(version = %self.config.version, entries = self.config.manifest.len(), "installing generation");
        let previous = self.transition(WorkerState::Installing).await;

        match self.install_generation().await {
            Ok(report) => {
                self.transition(WorkerState::Installed).await;
                tracing::info!(version = %report.version, entries = report.entries, "install complete");
                Ok(report)
            }
            Err(e) => {
                let restored = match previous {
                    WorkerState::Installed | WorkerState::Activated => previous,
                    _ => WorkerState::Redundant,
                };
                self.transition(restored).await;
                tracing::error!(version = %self.config.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn install_generation(&self) -> Result<InstallReport, Error> {
        let mut staged = Vec::with_capacity(self.config.manifest.len());

        for url in &self.config.manifest {
            let request = Request::get(url.clone());
            let response = self
                .transport
                .fetch(&request)
                .await
                .map_err(|e| Error::ManifestFetchFailed { url: url.to_string(), reason: e.to_string() })?;

            if !response.ok() {
                return Err(Error::ManifestFetchFailed {
                    url: url.to_string(),
                    reason: format!("status {}", response.status.as_u16()),
                });
            }

            staged.push(response.to_stored(&request));
        }

        let entries = self
            .db
            .commit_generation(&self.config.version, staged)
            .await
            .map_err(|e| Error::StoreWriteFailed(e.to_string()))?;

        Ok(InstallReport { version: self.config.version.clone(), entries, skip_waiting: true })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;

    use crate::fetch::ResponseType;
    use crate::worker::WorkerState;
    use crate::worker::mock::{APP_JS, CHART_JS, INDEX, MockTransport, SCOPE, worker};
    use frost_core::{CacheDb, Error, GenerationState};

    #[tokio::test]
    async fn test_install_commits_manifest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let transport = Arc::new(MockTransport::serving_manifest("v1"));
        let worker = worker("v1", &db, &transport);

        let report = worker.install().await.unwrap();

        assert_eq!(report.version, "v1");
        assert_eq!(report.entries, 4);
        assert!(report.skip_waiting);
        assert_eq!(worker.state().await, WorkerState::Installed);

        let generation = db.generation("v1").await.unwrap().unwrap();
        assert_eq!(generation.state, GenerationState::Ready);

        let mut keys = db.keys("v1").await.unwrap();
        keys.sort();
        let mut expected = vec![SCOPE.to_string(), INDEX.to_string(), APP_JS.to_string(), CHART_JS.to_string()];
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let transport = Arc::new(MockTransport::serving_manifest("v1"));
        let worker = worker("v1", &db, &transport);

        worker.install().await.unwrap();
        let first_keys = db.keys("v1").await.unwrap();
        let first_app = db.get_entry("v1", "GET", APP_JS).await.unwrap().unwrap();

        worker.install().await.unwrap();
        let second_keys = db.keys("v1").await.unwrap();
        let second_app = db.get_entry("v1", "GET", APP_JS).await.unwrap().unwrap();

        assert_eq!(first_keys, second_keys);
        assert_eq!(first_app.body, second_app.body);
        assert_eq!(first_app.status, second_app.status);
        assert_eq!(first_app.headers, second_app.headers);
        assert_eq!(db.list_generations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_install_failure_writes_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let transport = Arc::new(MockTransport::serving_manifest("v2"));
        transport.fail(CHART_JS);
        let worker = worker("v2", &db, &transport);

        let result = worker.install().await;

        assert!(matches!(result, Err(Error::ManifestFetchFailed { ref url, .. }) if url == CHART_JS));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(db.keys("v2").await.unwrap().is_empty());
        assert!(!db.is_generation_ready("v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_install_failure_keeps_previous_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let old_transport = Arc::new(MockTransport::serving_manifest("v1"));
        let old = worker("v1", &db, &old_transport);
        old.install().await.unwrap();
        old.activate().await.unwrap();
        let before = db.get_entry("v1", "GET", INDEX).await.unwrap().unwrap();

        let new_transport = Arc::new(MockTransport::serving_manifest("v2"));
        new_transport.serve_with(APP_JS, StatusCode::INTERNAL_SERVER_ERROR, ResponseType::Basic, "boom");
        let new = worker("v2", &db, &new_transport);

        let result = new.install().await;
        assert!(matches!(result, Err(Error::ManifestFetchFailed { ref reason, .. }) if reason == "status 500"));

        let after = db.get_entry("v1", "GET", INDEX).await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(db.keys("v1").await.unwrap().len(), 4);
        assert!(db.is_generation_ready("v1").await.unwrap());
        assert!(db.keys("v2").await.unwrap().is_empty());
        assert_eq!(old.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_failed_reinstall_keeps_state() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let transport = Arc::new(MockTransport::serving_manifest("v1"));
        let worker = worker("v1", &db, &transport);
        worker.install().await.unwrap();

        transport.set_offline(true);
        assert!(worker.install().await.is_err());

        assert_eq!(worker.state().await, WorkerState::Installed);
        assert_eq!(db.keys("v1").await.unwrap().len(), 4);
    }
}
