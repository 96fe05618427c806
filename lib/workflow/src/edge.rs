//! Edge types for workflow canvases.
//!
//! Edges connect a handle on one node to a handle on another. Each edge has:
//! - The source and target node IDs
//! - Optional handle names (e.g. `then` / `or` on an if-then-or node)
//! - Optional free-form data

use crate::node::NodeId;
use flowdeck_core::generated_id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

define_string_id!(
    /// A unique identifier for an edge within a workflow canvas.
    EdgeId
);

/// A directed edge between two node handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, JsonValue>>,
    /// Selection flag reported by the host UI. Never serialized.
    #[serde(skip)]
    pub selected: bool,
}

impl Edge {
    /// Creates an edge between two nodes using their default handles.
    #[must_use]
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self::from_connection(id, Connection::new(source, target))
    }

    /// Creates an edge from a connection candidate.
    #[must_use]
    pub fn from_connection(id: impl Into<EdgeId>, connection: Connection) -> Self {
        Self {
            id: id.into(),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            data: None,
            selected: false,
        }
    }

    /// Attaches data to the edge.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the connection this edge represents.
    #[must_use]
    pub fn connection(&self) -> Connection {
        Connection {
            source: self.source.clone(),
            target: self.target.clone(),
            source_handle: self.source_handle.clone(),
            target_handle: self.target_handle.clone(),
        }
    }

    /// Returns true if this edge touches the given node.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A proposed edge, as produced by a drag gesture between two handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Connection {
    /// Creates a connection between default handles.
    #[must_use]
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Sets the source handle.
    #[must_use]
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Sets the target handle.
    #[must_use]
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Returns the conventional diagram-UI edge ID for this connection,
    /// `xy-edge__{source}{sourceHandle}-{target}{targetHandle}`.
    #[must_use]
    pub fn default_edge_id(&self) -> EdgeId {
        EdgeId(format!(
            "xy-edge__{}{}-{}{}",
            self.source,
            self.source_handle.as_deref().unwrap_or_default(),
            self.target,
            self.target_handle.as_deref().unwrap_or_default(),
        ))
    }

    /// Returns a fresh, globally unique edge ID.
    #[must_use]
    pub fn unique_edge_id() -> EdgeId {
        EdgeId(generated_id("edge"))
    }

    /// Returns true if `edge` joins the same handles as this connection.
    #[must_use]
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
            && edge.target_handle == self.target_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_edge_id_includes_handles() {
        let plain = Connection::new("a", "b");
        assert_eq!(plain.default_edge_id().as_str(), "xy-edge__a-b");

        let branched = Connection::new("if1", "c").with_source_handle("then");
        assert_eq!(branched.default_edge_id().as_str(), "xy-edge__if1then-c");
    }

    #[test]
    fn edge_uses_camel_case_handles_on_the_wire() {
        let edge = Edge::from_connection(
            "e1",
            Connection::new("if1", "dest").with_source_handle("or"),
        );
        let value = serde_json::to_value(&edge).expect("serialize");
        assert_eq!(
            value,
            json!({"id": "e1", "source": "if1", "target": "dest", "sourceHandle": "or"})
        );
    }

    #[test]
    fn connection_matches_same_handles_only() {
        let edge =
            Edge::from_connection("e1", Connection::new("a", "b").with_source_handle("then"));
        assert!(Connection::new("a", "b").with_source_handle("then").matches(&edge));
        assert!(!Connection::new("a", "b").with_source_handle("or").matches(&edge));
        assert!(!Connection::new("a", "b").matches(&edge));
    }

    #[test]
    fn selection_is_not_serialized() {
        let mut edge = Edge::new("e1", "a", "b");
        edge.selected = true;
        let value = serde_json::to_value(&edge).expect("serialize");
        assert!(value.get("selected").is_none());
    }

    #[test]
    fn edge_touches_either_endpoint() {
        let edge = Edge::new("e1", "a", "b");
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
    }

    #[test]
    fn unique_edge_ids_differ() {
        assert_ne!(Connection::unique_edge_id(), Connection::unique_edge_id());
    }
}
