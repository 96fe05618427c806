//! Stored workflow documents.
//!
//! A [`Workflow`] pairs a canvas graph with the bookkeeping a store needs to
//! list it: a stable ID, the name it is saved under and edit timestamps.

use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use chrono::{DateTime, Utc};
use flowdeck_core::WorkflowId;
use serde::{Deserialize, Serialize};

/// Name and timestamps of a stored workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Store key; also shown in listings.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever the graph is replaced.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A canvas graph together with its metadata.
///
/// This is the document a [`WorkflowStore`](crate::store::WorkflowStore)
/// persists and the editor loads its graph from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub metadata: WorkflowMetadata,
    pub graph: WorkflowGraph,
}

impl Workflow {
    /// Creates an empty workflow with a fresh ID.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::new(),
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_graph(mut self, graph: WorkflowGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Stores a new graph snapshot and bumps `updated_at`.
    pub fn set_graph(&mut self, graph: WorkflowGraph) {
        self.graph = graph;
        self.metadata.updated_at = Utc::now();
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Checks the graph invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] found in the graph.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.validate()
    }
}

/// One row of a workflow listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.metadata.name.clone(),
            description: workflow.metadata.description.clone(),
            node_count: workflow.graph.node_count(),
            edge_count: workflow.graph.edge_count(),
            updated_at: workflow.metadata.updated_at,
        }
    }
}
