//! HTTP client for the workflow execution service.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use flowdeck_workflow::{ExecutionError, ExecutionRequest, ExecutionResult, WorkflowExecutor};
use rootcause::prelude::Report;
use tracing::{info, instrument, warn};

/// Submits graphs to `POST {base_url}/execute`.
#[derive(Debug, Clone)]
pub struct HttpExecutionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpExecutionClient {
    /// Creates a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::RequestFailed`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &ServiceConfig) -> Result<Self, Report<ExecutionError>> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExecutionError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: config.url("execute"),
        })
    }

    /// Submits the request and returns the service's answer, or the reason
    /// it could not be obtained.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the service answers
    /// with a non-success status, or the response cannot be decoded.
    pub async fn try_execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, Report<ExecutionError>> {
        Ok(self.send(request).await?)
    }

    async fn send(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ExecutionError::RequestFailed {
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ExecutionResult>()
            .await
            .map_err(|e| ExecutionError::ResponseParseFailed {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl WorkflowExecutor for HttpExecutionClient {
    #[instrument(
        skip(self, request),
        fields(workflow_id = %request.workflow_id, nodes = request.nodes.len())
    )]
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        match self.send(&request).await {
            Ok(result) => {
                info!(success = result.success, "workflow executed");
                result
            }
            Err(err) => {
                warn!(error = %err, endpoint = %self.endpoint, "workflow execution failed");
                ExecutionResult::failure(err)
            }
        }
    }
}
