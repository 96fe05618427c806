//! Workflow persistence.
//!
//! Workflows are stored and looked up by name. Stores validate the graph
//! on save so an invalid canvas never reaches storage.

use crate::definition::{Workflow, WorkflowSummary};
use crate::error::StoreError;
use async_trait::async_trait;
use flowdeck_core::Result;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Loads and saves workflow documents.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads the workflow stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `name`.
    async fn load(&self, name: &str) -> Result<Workflow, StoreError>;

    /// Saves the workflow under its name, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidGraph`] if the graph fails validation.
    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError>;

    /// Lists stored workflows ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError>;

    /// Deletes the workflow stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `name`.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Checks a workflow's graph before it is persisted.
///
/// # Errors
///
/// Returns [`StoreError::InvalidGraph`] naming the failed check.
pub fn ensure_valid(workflow: &Workflow) -> std::result::Result<(), StoreError> {
    workflow.validate().map_err(|e| StoreError::InvalidGraph {
        name: workflow.name().to_string(),
        details: e.to_string(),
    })
}

/// A store that keeps workflows in memory.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<BTreeMap<String, Workflow>>,
}

impl InMemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn load(&self, name: &str) -> Result<Workflow, StoreError> {
        let workflows = self.workflows.read().await;
        let workflow = workflows.get(name).cloned().ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        Ok(workflow)
    }

    #[instrument(skip(self, workflow), fields(name = %workflow.name()))]
    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
        ensure_valid(workflow)?;
        self.workflows
            .write()
            .await
            .insert(workflow.name().to_string(), workflow.clone());
        debug!(nodes = workflow.graph.node_count(), "saved workflow");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.values().map(WorkflowSummary::from).collect())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        if self.workflows.write().await.remove(name).is_none() {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
