//! Error types for the workflow crate.
//!
//! Core editing errors are local and recoverable:
//! - `ConnectionError`: A proposed edge was rejected (silently, from the UI's view)
//! - `GraphError`: A change or loaded graph violates a graph invariant
//! - `LayoutError`: Auto-layout gave up; callers keep the previous positions
//!
//! Collaborator errors (`StoreError`, `ExecutionError`, `CatalogError`) are
//! wrapped in a rootcause `Report` as they propagate out of I/O.

use crate::node::{NodeId, NodeType};
use std::fmt;

/// Reasons a proposed connection is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Source and target are the same node.
    SelfLoop { node_id: NodeId },
    /// The edge would close a directed cycle.
    WouldCreateCycle { source: NodeId, target: NodeId },
    /// An endpoint does not exist in the graph.
    NodeNotFound { node_id: NodeId },
    /// An edge between the same handles already exists.
    Duplicate { source: NodeId, target: NodeId },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfLoop { node_id } => write!(f, "node {node_id} cannot connect to itself"),
            Self::WouldCreateCycle { source, target } => {
                write!(f, "edge {source} -> {target} would create a cycle")
            }
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::Duplicate { source, target } => {
                write!(f, "edge {source} -> {target} already exists")
            }
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Errors from graph changes and graph validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A removal targeted a protected (trigger) node.
    ProtectedNode { node_id: NodeId },
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Two nodes share an ID.
    DuplicateNode { node_id: NodeId },
    /// Two edges share an ID.
    DuplicateEdge { edge_id: String },
    /// An edge references a node that does not exist.
    DanglingEdge { edge_id: String, node_id: NodeId },
    /// Graph contains cycles.
    CycleDetected,
    /// Node data does not fit the node type's shape.
    InvalidNodeData { node_type: NodeType, reason: String },
    /// A node type name is not recognised.
    UnknownNodeType { name: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedNode { node_id } => {
                write!(f, "node {node_id} is a trigger and cannot be removed")
            }
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::DuplicateNode { node_id } => write!(f, "duplicate node id: {node_id}"),
            Self::DuplicateEdge { edge_id } => write!(f, "duplicate edge id: {edge_id}"),
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge {edge_id} references missing node {node_id}")
            }
            Self::CycleDetected => write!(f, "graph contains cycles"),
            Self::InvalidNodeData { node_type, reason } => {
                write!(f, "invalid data for {node_type} node: {reason}")
            }
            Self::UnknownNodeType { name } => write!(f, "unknown node type: {name}"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Rank assignment did not settle within its iteration budget.
    NonConvergence { iterations: usize },
    /// A layout direction name is not recognised.
    UnknownDirection { name: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConvergence { iterations } => {
                write!(f, "layout did not converge after {iterations} iterations")
            }
            Self::UnknownDirection { name } => {
                write!(f, "unknown layout direction '{name}', expected TB, BT, LR or RL")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Errors from workflow persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No workflow is stored under this name.
    NotFound { name: String },
    /// Reading or writing the backing store failed.
    Io { name: String, details: String },
    /// The stored document could not be encoded or decoded.
    Serialization { name: String, details: String },
    /// The stored graph violates a graph invariant.
    InvalidGraph { name: String, details: String },
    /// The document stored under `name` belongs to another workflow.
    NameMismatch { name: String, found: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "workflow not found: {name}"),
            Self::Io { name, details } => write!(f, "storage error for workflow {name}: {details}"),
            Self::Serialization { name, details } => {
                write!(f, "failed to encode or decode workflow {name}: {details}")
            }
            Self::InvalidGraph { name, details } => {
                write!(f, "workflow {name} has an invalid graph: {details}")
            }
            Self::NameMismatch { name, found } => {
                write!(f, "document for workflow {name} holds workflow {found}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors talking to the workflow execution service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The request could not be delivered.
    RequestFailed { reason: String },
    /// The service answered with a non-success status.
    ServiceError { status: u16, body: String },
    /// The response body was not a valid execution result.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "execution request failed: {reason}"),
            Self::ServiceError { status, body } => {
                write!(f, "execution service returned {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse execution response: {reason}")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

/// Errors fetching agent definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog service is unreachable.
    Unavailable { reason: String },
    /// The catalog answered with a non-success status.
    ServiceError { status: u16 },
    /// The catalog response could not be decoded.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "agent catalog unavailable: {reason}"),
            Self::ServiceError { status } => write!(f, "agent catalog returned {status}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse agent catalog: {reason}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display() {
        let err = ConnectionError::WouldCreateCycle {
            source: NodeId::new("B"),
            target: NodeId::new("T"),
        };
        assert_eq!(err.to_string(), "edge B -> T would create a cycle");
    }

    #[test]
    fn graph_error_display() {
        let err = GraphError::ProtectedNode {
            node_id: NodeId::new("T"),
        };
        assert!(err.to_string().contains("cannot be removed"));
    }

    #[test]
    fn invalid_node_data_names_the_type() {
        let err = GraphError::InvalidNodeData {
            node_type: NodeType::AiAgent,
            reason: "bad tools".to_string(),
        };
        assert_eq!(err.to_string(), "invalid data for ai-agent node: bad tools");
    }

    #[test]
    fn layout_error_display() {
        let err = LayoutError::NonConvergence { iterations: 12 };
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound {
            name: "onboarding".to_string(),
        };
        assert_eq!(err.to_string(), "workflow not found: onboarding");
    }

    #[test]
    fn execution_error_display() {
        let err = ExecutionError::ServiceError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }
}
