//! sw_install tool implementation.
//!
//! Dispatches the install signal: fetch the manifest and commit it as the
//! current generation.

use frost_client::{ServiceWorker, Transport};
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

/// Implementation of the sw_install tool.
pub async fn install_impl<T: Transport>(worker: &ServiceWorker<T>) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{decode, worker};

    #[tokio::test]
    async fn test_install_impl() {
        let (worker, _) = worker("v1").await;

        let result = install_impl(worker.as_ref()).await.unwrap();
        let output: serde_json::Value = decode(&result);

        assert_eq!(output["version"], "v1");
        assert_eq!(output["entries"], 1);
        assert_eq!(output["skip_waiting"], true);
    }

    #[tokio::test]
    async fn test_install_impl_reports_manifest_failure() {
        let (worker, _) = worker("v1").await;
        let db = worker.db().clone();
        let transport = std::sync::Arc::new(crate::tools::testing::StaticTransport::default());
        let offline = ServiceWorker::from_app_config(&crate::tools::testing::config("v1"), db, transport).unwrap();

        let err = install_impl(&offline).await.unwrap_err();
        assert_eq!(err.code.0, -32020);
    }
}
