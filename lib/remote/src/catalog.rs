//! HTTP client for the agent catalog service.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use flowdeck_workflow::{AgentCatalog, AgentDefinition, CatalogError};
use rootcause::prelude::Report;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Fetches palette entries from `GET {base_url}/agents`.
#[derive(Debug, Clone)]
pub struct HttpAgentCatalog {
    client: reqwest::Client,
    endpoint: String,
}

/// The service answers with either a bare list or `{"agents": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AgentsResponse {
    List(Vec<AgentDefinition>),
    Wrapped { agents: Vec<AgentDefinition> },
}

impl From<AgentsResponse> for Vec<AgentDefinition> {
    fn from(response: AgentsResponse) -> Self {
        match response {
            AgentsResponse::List(agents) | AgentsResponse::Wrapped { agents } => agents,
        }
    }
}

impl HttpAgentCatalog {
    /// Creates a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(config: &ServiceConfig) -> Result<Self, Report<CatalogError>> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CatalogError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: config.url("agents"),
        })
    }
}

#[async_trait]
impl AgentCatalog for HttpAgentCatalog {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_agents(&self) -> Result<Vec<AgentDefinition>, Report<CatalogError>> {
        let response = self.client.get(&self.endpoint).send().await.map_err(|e| {
            warn!(error = %e, "agent catalog unreachable");
            CatalogError::Unavailable {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "agent catalog returned error");
            return Err(CatalogError::ServiceError {
                status: status.as_u16(),
            }
            .into());
        }

        let agents: Vec<AgentDefinition> = response
            .json::<AgentsResponse>()
            .await
            .map_err(|e| CatalogError::ResponseParseFailed {
                reason: e.to_string(),
            })?
            .into();
        debug!(count = agents.len(), "fetched agent definitions");
        Ok(agents)
    }
}
