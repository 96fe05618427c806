//! Workflow execution hand-off.
//!
//! The canvas does not run workflows itself. It packages the current graph
//! into an [`ExecutionRequest`] and hands it to a [`WorkflowExecutor`], which
//! answers with an [`ExecutionResult`]. Executors never fail outright:
//! transport and service failures are folded into a failed result so the
//! host UI always has something to show.

use crate::definition::Workflow;
use crate::edge::Edge;
use crate::graph::WorkflowGraph;
use crate::node::Node;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowdeck_core::WorkflowId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// The payload sent to the execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// Canvas nodes in their current order.
    pub nodes: Vec<Node>,
    /// Canvas edges in their current order.
    pub edges: Vec<Edge>,
}

impl ExecutionRequest {
    /// Packages a graph snapshot for execution.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, graph: &WorkflowGraph) -> Self {
        Self {
            workflow_id,
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }
}

impl From<&Workflow> for ExecutionRequest {
    fn from(workflow: &Workflow) -> Self {
        Self::new(workflow.id, &workflow.graph)
    }
}

/// The outcome reported by the execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Output produced by the run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Failure description, if the run did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    /// Creates a successful result stamped now.
    #[must_use]
    pub fn success(result: Option<JsonValue>) -> Self {
        Self {
            success: true,
            result,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed result stamped now.
    #[must_use]
    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Runs workflows on behalf of the canvas.
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    /// Executes the request. Failures are reported through
    /// [`ExecutionResult::failure`], never as an error.
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::node::{NodeType, Position};
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl WorkflowExecutor for EchoExecutor {
        async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
            if request.nodes.is_empty() {
                return ExecutionResult::failure("nothing to run");
            }
            ExecutionResult::success(Some(json!({ "nodes": request.nodes.len() })))
        }
    }

    fn graph() -> WorkflowGraph {
        WorkflowGraph::from_parts(
            vec![
                Node::of_type("T", NodeType::Trigger, Position::default()),
                Node::of_type("D", NodeType::Destination, Position::new(0.0, 86.0)),
            ],
            vec![Edge::new("e1", "T", "D")],
        )
    }

    #[test]
    fn request_copies_graph_in_order() {
        let workflow = Workflow::new("Run me").with_graph(graph());
        let request = ExecutionRequest::from(&workflow);

        assert_eq!(request.workflow_id, workflow.id);
        assert_eq!(request.nodes[0].id(), "T");
        assert_eq!(request.nodes[1].id(), "D");
        assert_eq!(request.edges.len(), 1);
    }

    #[test]
    fn result_wire_shape() {
        let value = serde_json::to_value(ExecutionResult::failure(ExecutionError::RequestFailed {
            reason: "connection refused".to_string(),
        }))
        .expect("serialize");

        assert_eq!(value["success"], json!(false));
        assert!(value.get("result").is_none());
        assert!(value["error"].as_str().is_some_and(|e| e.contains("connection refused")));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn result_decodes_service_response() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "success": true,
            "result": {"delivered": 3},
            "timestamp": "2025-01-01T00:00:00Z"
        }))
        .expect("deserialize");

        assert!(result.success);
        assert_eq!(result.result, Some(json!({"delivered": 3})));
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn executor_reports_failures_as_results() {
        let executor = EchoExecutor;

        let ok = executor
            .execute(ExecutionRequest::new(WorkflowId::new(), &graph()))
            .await;
        assert!(ok.success);

        let failed = executor
            .execute(ExecutionRequest::new(WorkflowId::new(), &WorkflowGraph::new()))
            .await;
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("nothing to run"));
    }
}
