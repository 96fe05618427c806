//! Change records exchanged with the host UI.
//!
//! Diagram UI libraries report user gestures as batches of tagged records
//! (`{"type": "position", "id": ..., "position": ...}`). The graph applies
//! them in order to produce the next snapshot.

use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId, Position};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A change to the node set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    /// Insert a new node.
    Add { node: Node },
    /// Delete a node and its incident edges. Dropped for trigger nodes.
    Remove { id: NodeId },
    /// Move a node.
    Position { id: NodeId, position: Position },
    /// Merge keys into a node's data.
    Update {
        id: NodeId,
        data: Map<String, JsonValue>,
    },
    /// Toggle the transient selection flag.
    Select { id: NodeId, selected: bool },
}

impl NodeChange {
    #[must_use]
    pub fn add(node: Node) -> Self {
        Self::Add { node }
    }

    #[must_use]
    pub fn remove(id: impl Into<NodeId>) -> Self {
        Self::Remove { id: id.into() }
    }

    #[must_use]
    pub fn position(id: impl Into<NodeId>, position: Position) -> Self {
        Self::Position {
            id: id.into(),
            position,
        }
    }

    #[must_use]
    pub fn update(id: impl Into<NodeId>, data: Map<String, JsonValue>) -> Self {
        Self::Update {
            id: id.into(),
            data,
        }
    }

    /// Returns true for changes that only affect presentation
    /// (moves and selection) rather than workflow content.
    #[must_use]
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::Position { .. } | Self::Select { .. })
    }
}

/// A change to the edge set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    /// Insert a new edge. Validated like a connection.
    Add { edge: Edge },
    /// Delete an edge.
    Remove { id: EdgeId },
    /// Replace an edge's data and, when given, its handles.
    Update {
        id: EdgeId,
        #[serde(default)]
        data: Option<Map<String, JsonValue>>,
        #[serde(default, rename = "sourceHandle", skip_serializing_if = "Option::is_none")]
        source_handle: Option<String>,
        #[serde(default, rename = "targetHandle", skip_serializing_if = "Option::is_none")]
        target_handle: Option<String>,
    },
    /// Toggle the transient selection flag.
    Select { id: EdgeId, selected: bool },
}

impl EdgeChange {
    #[must_use]
    pub fn add(edge: Edge) -> Self {
        Self::Add { edge }
    }

    #[must_use]
    pub fn remove(id: impl Into<EdgeId>) -> Self {
        Self::Remove { id: id.into() }
    }

    /// Replaces an edge's data, leaving its handles as they are.
    #[must_use]
    pub fn update(id: impl Into<EdgeId>, data: Option<Map<String, JsonValue>>) -> Self {
        Self::Update {
            id: id.into(),
            data,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Returns true for selection-only changes.
    #[must_use]
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::Select { .. })
    }
}
