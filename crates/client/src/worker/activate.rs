//! Activate: evict superseded generations and claim open sessions.

use serde::Serialize;

use super::{ServiceWorker, WorkerState};
use crate::fetch::Transport;
use frost_core::Error;

/// Result of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub version: String,
    /// Stale generations that were deleted.
    pub deleted: Vec<String>,
    /// Stale generations that survived every delete attempt.
    pub failed: Vec<String>,
    /// Open sessions now route through this generation.
    pub claimed: bool,
}

impl<T: Transport> ServiceWorker<T> {
    /// Delete every generation except this worker's and take over open sessions.
    ///
    /// A stale generation that cannot be deleted after `max_delete_attempts`
    /// tries is logged and reported, and does not fail the activation; the
    /// next activation tries again.
    ///
    /// # Errors
    ///
    /// - `GenerationNotReady` if this worker's generation was never installed
    /// - store errors while enumerating generations or recording the claim;
    ///   the worker then returns to the state it had before activating
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let version = self.config.version.clone();
        if !self.db.is_generation_ready(&version).await? {
            return Err(Error::GenerationNotReady(version));
        }

        tracing::info!(version = %version, "activating generation");
        let previous = self.transition(WorkerState::Activating).await;

        match self.activate_generation(version).await {
            Ok(report) => {
                self.transition(WorkerState::Activated).await;
                tracing::info!(
                    version = %report.version,
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    "activation complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(previous).await;
                tracing::error!(version = %self.config.version, error = %e, "activation failed");
                Err(e)
            }
        }
    }

    async fn activate_generation(&self, version: String) -> Result<ActivateReport, Error> {
        let stale: Vec<String> = self
            .db
            .list_generations()
            .await?
            .into_iter()
            .map(|generation| generation.version)
            .filter(|name| *name != version)
            .collect();

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for name in stale {
            match self.delete_stale(&name).await {
                Ok(()) => deleted.push(name),
                Err(e) => {
                    tracing::warn!(error = %e, "keeping stale generation until next activation");
                    failed.push(name);
                }
            }
        }

        let claimed = self.db.mark_activated(&version).await?;
        Ok(ActivateReport { version, deleted, failed, claimed })
    }

    async fn delete_stale(&self, name: &str) -> Result<(), Error> {
        let mut last_error = String::new();
        tracing::info!("deleting old cache: {}", name);
        for attempt in 1..=self.config.max_delete_attempts {
            match self.db.delete_generation(name).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::debug!(generation = name, attempt, error = %e, "delete attempt failed");
                    last_error = e.to_string();
                }
            }
        }
        Err(Error::StaleGenerationDeleteFailed { version: name.to_string(), reason: last_error })
    }
}
