//! Workflow canvas graph.
//!
//! A workflow graph is an ordered list of nodes and an ordered list of edges,
//! matching the arrays the host UI renders. Every mutation goes through a
//! change batch or [`WorkflowGraph::connect`] and yields a new graph; the
//! previous snapshot stays valid, which is what the editor's undo history
//! builds on.
//!
//! The graph stays acyclic: each proposed edge is checked against the
//! current edge set before it is added.

use crate::change::{EdgeChange, NodeChange};
use crate::cycle;
use crate::edge::{Connection, Edge};
use crate::error::{ConnectionError, GraphError};
use crate::node::{Node, NodeId, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A workflow canvas: nodes plus directed edges between their handles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from existing collections without validating them.
    ///
    /// Use [`WorkflowGraph::validate`] for graphs that come from storage.
    #[must_use]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Splits the graph into its node and edge lists.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns a node by its ID.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == node_id)
    }

    /// Returns an edge by its ID.
    #[must_use]
    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    #[must_use]
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the downstream neighbours of a node.
    #[must_use]
    pub fn outgoers(&self, node_id: &str) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.source == node_id)
            .filter_map(|e| self.node(e.target.as_str()))
            .collect()
    }

    /// Returns the upstream neighbours of a node.
    #[must_use]
    pub fn incomers(&self, node_id: &str) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .filter_map(|e| self.node(e.source.as_str()))
            .collect()
    }

    /// Returns nodes that have no incoming edges (entry points).
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| &e.target == n.id()))
            .collect()
    }

    /// Returns nodes that have no outgoing edges (terminal nodes).
    #[must_use]
    pub fn terminal_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| &e.source == n.id()))
            .collect()
    }

    /// Returns all trigger nodes.
    #[must_use]
    pub fn trigger_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_trigger()).collect()
    }

    /// Applies a batch of node changes in order and returns the new graph.
    ///
    /// Removals of trigger nodes are dropped. Changes that reference unknown
    /// nodes, add a duplicate ID, or carry data that does not fit the node's
    /// type are dropped as well. `self` is left untouched.
    #[must_use]
    pub fn apply_node_changes(&self, changes: impl IntoIterator<Item = NodeChange>) -> Self {
        let mut next = self.clone();
        for change in changes {
            if let Err(err) = next.apply_node_change(change) {
                debug!(error = %err, "dropped node change");
            }
        }
        next
    }

    /// Applies a batch of edge changes in order and returns the new graph.
    ///
    /// Added edges are validated exactly like [`WorkflowGraph::connect`];
    /// rejected ones are dropped. `self` is left untouched.
    #[must_use]
    pub fn apply_edge_changes(&self, changes: impl IntoIterator<Item = EdgeChange>) -> Self {
        let mut next = self.clone();
        for change in changes {
            next.apply_edge_change(change);
        }
        next
    }

    /// Validates `candidate` and returns the graph with the new edge appended.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the edge is a self loop, references a
    /// missing node, duplicates an existing edge, or would close a cycle.
    pub fn connect(&self, candidate: &Connection) -> Result<(Self, Edge), ConnectionError> {
        self.check_connection(candidate)?;

        let mut id = candidate.default_edge_id();
        if self.edge(id.as_str()).is_some() {
            id = Connection::unique_edge_id();
        }
        let edge = Edge::from_connection(id, candidate.clone());

        let mut next = self.clone();
        next.edges.push(edge.clone());
        Ok((next, edge))
    }

    /// Returns true if `candidate` would be accepted by [`WorkflowGraph::connect`].
    #[must_use]
    pub fn is_valid_connection(&self, candidate: &Connection) -> bool {
        self.check_connection(candidate).is_ok()
    }

    /// Checks a proposed edge without changing the graph.
    ///
    /// # Errors
    ///
    /// See [`WorkflowGraph::connect`].
    pub fn check_connection(&self, candidate: &Connection) -> Result<(), ConnectionError> {
        let (source, target) = (&candidate.source, &candidate.target);
        if source == target {
            return Err(ConnectionError::SelfLoop {
                node_id: source.clone(),
            });
        }
        for endpoint in [source, target] {
            if !self.contains_node(endpoint.as_str()) {
                return Err(ConnectionError::NodeNotFound {
                    node_id: endpoint.clone(),
                });
            }
        }
        if self.edges.iter().any(|e| candidate.matches(e)) {
            return Err(ConnectionError::Duplicate {
                source: source.clone(),
                target: target.clone(),
            });
        }
        if cycle::would_create_cycle(&self.edges, source.as_str(), target.as_str()) {
            return Err(ConnectionError::WouldCreateCycle {
                source: source.clone(),
                target: target.clone(),
            });
        }
        Ok(())
    }

    /// Returns a copy whose node positions are taken from `positioned`,
    /// matched by node ID. Nodes missing from `positioned` keep their place.
    #[must_use]
    pub fn with_positions_from(&self, positioned: &[Node]) -> Self {
        let positions: HashMap<&NodeId, Position> =
            positioned.iter().map(|n| (n.id(), n.position)).collect();
        let mut next = self.clone();
        for node in &mut next.nodes {
            if let Some(position) = positions.get(node.id()) {
                node.position = *position;
            }
        }
        next
    }

    /// Validates the whole graph.
    ///
    /// Checks:
    /// - Node and edge IDs are unique
    /// - Every edge references existing nodes
    /// - No cycles (DAG validation), self loops included
    ///
    /// # Errors
    ///
    /// Returns an error describing the first validation failure.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id().as_str()) {
                return Err(GraphError::DuplicateNode {
                    node_id: node.id().clone(),
                });
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::DuplicateEdge {
                    edge_id: edge.id.to_string(),
                });
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge_id: edge.id.to_string(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        if cycle::has_cycle(&self.nodes, &self.edges) {
            return Err(GraphError::CycleDetected);
        }

        Ok(())
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id() == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })
    }

    fn apply_node_change(&mut self, change: NodeChange) -> Result<(), GraphError> {
        match change {
            NodeChange::Add { node } => {
                if self.contains_node(node.id().as_str()) {
                    return Err(GraphError::DuplicateNode {
                        node_id: node.id().clone(),
                    });
                }
                self.nodes.push(node);
            }
            NodeChange::Remove { id } => {
                let node = self.node_mut(&id)?;
                if node.is_trigger() {
                    return Err(GraphError::ProtectedNode { node_id: id });
                }
                self.nodes.retain(|n| n.id() != &id);
                self.edges.retain(|e| !e.touches(id.as_str()));
            }
            NodeChange::Position { id, position } => {
                self.node_mut(&id)?.position = position;
            }
            NodeChange::Update { id, data } => {
                let node = self.node_mut(&id)?;
                *node = node.with_merged_data(&data)?;
            }
            NodeChange::Select { id, selected } => {
                self.node_mut(&id)?.selected = selected;
            }
        }
        Ok(())
    }

    fn apply_edge_change(&mut self, change: EdgeChange) {
        match change {
            EdgeChange::Add { edge } => {
                if self.edge(edge.id.as_str()).is_some() {
                    debug!(edge_id = %edge.id, "dropped edge with duplicate id");
                    return;
                }
                if let Err(err) = self.check_connection(&edge.connection()) {
                    debug!(edge_id = %edge.id, error = %err, "dropped invalid edge");
                    return;
                }
                self.edges.push(edge);
            }
            EdgeChange::Remove { id } => {
                self.edges.retain(|e| e.id != id);
            }
            EdgeChange::Update {
                id,
                data,
                source_handle,
                target_handle,
            } => {
                let Some(index) = self.edges.iter().position(|e| e.id == id) else {
                    return;
                };
                let mut candidate = self.edges[index].connection();
                candidate.source_handle = source_handle.or(candidate.source_handle);
                candidate.target_handle = target_handle.or(candidate.target_handle);
                let duplicate = self
                    .edges
                    .iter()
                    .any(|e| e.id != id && candidate.matches(e));

                let edge = &mut self.edges[index];
                edge.data = data;
                if duplicate {
                    debug!(edge_id = %id, "kept handles, update would duplicate an edge");
                } else {
                    edge.source_handle = candidate.source_handle;
                    edge.target_handle = candidate.target_handle;
                }
            }
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = self.edges.iter_mut().find(|e| e.id == id) {
                    edge.selected = selected;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use serde_json::json;

    fn node(id: &str, node_type: NodeType) -> Node {
        Node::of_type(id, node_type, Position::default())
    }

    /// T(trigger) -> A(transformer) -> B(destination)
    fn trigger_chain() -> WorkflowGraph {
        WorkflowGraph::from_parts(
            vec![
                node("T", NodeType::Trigger),
                node("A", NodeType::Transformer),
                node("B", NodeType::Destination),
            ],
            vec![Edge::new("e1", "T", "A"), Edge::new("e2", "A", "B")],
        )
    }

    #[test]
    fn add_node_to_empty_graph() {
        let graph = WorkflowGraph::new();
        let next = graph.apply_node_changes([NodeChange::add(node("N1", NodeType::Webhook))]);

        assert_eq!(next.node_count(), 1);
        assert_eq!(next.nodes()[0].id().as_str(), "N1");
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn trigger_node_survives_removal() {
        let graph = WorkflowGraph::from_parts(
            vec![node("T", NodeType::Trigger), node("B", NodeType::Destination)],
            vec![Edge::new("e1", "T", "B")],
        );
        let next = graph.apply_node_changes([NodeChange::remove("T")]);

        assert!(next.contains_node("T"));
        assert_eq!(next.edge_count(), 1);
    }

    #[test]
    fn removing_node_drops_incident_edges() {
        let next = trigger_chain().apply_node_changes([NodeChange::remove("A")]);

        assert_eq!(next.node_count(), 2);
        assert_eq!(next.edge_count(), 0);
    }

    #[test]
    fn changes_apply_in_order() {
        let next = WorkflowGraph::new().apply_node_changes([
            NodeChange::add(node("N1", NodeType::Parser)),
            NodeChange::position("N1", Position::new(3.0, 4.0)),
            NodeChange::update(
                "N1",
                json!({"parse_type": "csv"}).as_object().cloned().unwrap_or_default(),
            ),
        ]);

        let n1 = next.node("N1").expect("node present");
        assert_eq!(n1.position, Position::new(3.0, 4.0));
        assert_eq!(n1.data().to_json()["parse_type"], json!("csv"));
    }

    #[test]
    fn invalid_update_is_dropped() {
        let graph = WorkflowGraph::from_parts(vec![node("W", NodeType::Webhook)], vec![]);
        let patch = json!({"webhook_url": "not a url"});
        let next = graph.apply_node_changes([NodeChange::update(
            "W",
            patch.as_object().cloned().unwrap_or_default(),
        )]);

        assert_eq!(next, graph);
    }

    #[test]
    fn duplicate_add_is_dropped() {
        let graph = WorkflowGraph::from_parts(vec![node("A", NodeType::Parser)], vec![]);
        let next = graph.apply_node_changes([NodeChange::add(node("A", NodeType::Webhook))]);

        assert_eq!(next.node_count(), 1);
        assert_eq!(next.nodes()[0].node_type(), NodeType::Parser);
    }

    #[test]
    fn connect_rejects_cycle_and_accepts_shortcut() {
        let graph = trigger_chain();

        let err = graph.connect(&Connection::new("B", "T")).unwrap_err();
        assert_eq!(
            err,
            ConnectionError::WouldCreateCycle {
                source: NodeId::new("B"),
                target: NodeId::new("T"),
            }
        );

        let (next, edge) = graph.connect(&Connection::new("T", "B")).expect("acyclic");
        assert_eq!(next.edge_count(), 3);
        assert_eq!(edge.id.as_str(), "xy-edge__T-B");
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn connect_rejects_self_loop() {
        let graph = trigger_chain();
        let err = graph.connect(&Connection::new("A", "A")).unwrap_err();
        assert!(matches!(err, ConnectionError::SelfLoop { .. }));
    }

    #[test]
    fn self_loop_rejected_even_for_unknown_node() {
        let err = WorkflowGraph::new()
            .connect(&Connection::new("A", "A"))
            .unwrap_err();
        assert!(matches!(err, ConnectionError::SelfLoop { .. }));
    }

    #[test]
    fn connect_rejects_missing_node_and_duplicates() {
        let graph = trigger_chain();
        assert!(matches!(
            graph.connect(&Connection::new("T", "Z")),
            Err(ConnectionError::NodeNotFound { .. })
        ));
        assert!(matches!(
            graph.connect(&Connection::new("T", "A")),
            Err(ConnectionError::Duplicate { .. })
        ));
    }

    #[test]
    fn branch_handles_allow_parallel_edges() {
        let graph = WorkflowGraph::from_parts(
            vec![node("IF", NodeType::IfThenOr), node("D", NodeType::Destination)],
            vec![],
        );
        let (graph, _) = graph
            .connect(&Connection::new("IF", "D").with_source_handle("then"))
            .expect("then edge");
        let (graph, _) = graph
            .connect(&Connection::new("IF", "D").with_source_handle("or"))
            .expect("or edge");

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn added_edges_are_validated() {
        let graph = trigger_chain();
        let next = graph.apply_edge_changes([
            EdgeChange::add(Edge::new("back", "B", "T")),
            EdgeChange::add(Edge::new("dangling", "B", "missing")),
            EdgeChange::add(Edge::new("ok", "T", "B")),
        ]);

        assert_eq!(next.edge_count(), 3);
        assert!(next.edge("ok").is_some());
        assert!(next.edge("back").is_none());
    }

    #[test]
    fn edge_update_and_remove() {
        let data = json!({"label": "yes"}).as_object().cloned();
        let next = trigger_chain().apply_edge_changes([
            EdgeChange::update("e1", data.clone()),
            EdgeChange::remove("e2"),
        ]);

        assert_eq!(next.edge("e1").and_then(|e| e.data.clone()), data);
        assert!(next.edge("e1").and_then(|e| e.source_handle.clone()).is_none());
        assert!(next.edge("e2").is_none());
    }

    #[test]
    fn edge_update_moves_handles_unless_duplicate() {
        let graph = WorkflowGraph::from_parts(
            vec![node("IF", NodeType::IfThenOr), node("D", NodeType::Destination)],
            vec![
                Edge::from_connection(
                    "then",
                    Connection::new("IF", "D").with_source_handle("then"),
                ),
                Edge::from_connection(
                    "or",
                    Connection::new("IF", "D").with_source_handle("or"),
                ),
            ],
        );
        let label = json!({"label": "fallback"}).as_object().cloned();

        let clash = graph.apply_edge_changes([EdgeChange::Update {
            id: "or".into(),
            data: label.clone(),
            source_handle: Some("then".to_string()),
            target_handle: None,
        }]);
        let or_edge = clash.edge("or").expect("edge kept");
        assert_eq!(or_edge.source_handle.as_deref(), Some("or"));
        assert_eq!(or_edge.data, label);

        let moved = graph.apply_edge_changes([EdgeChange::Update {
            id: "or".into(),
            data: None,
            source_handle: Some("else".to_string()),
            target_handle: Some("in".to_string()),
        }]);
        let or_edge = moved.edge("or").expect("edge kept");
        assert_eq!(or_edge.source_handle.as_deref(), Some("else"));
        assert_eq!(or_edge.target_handle.as_deref(), Some("in"));
        assert_eq!(moved.edge_count(), 2);
    }

    #[test]
    fn is_valid_connection_does_not_mutate() {
        let graph = trigger_chain();
        let before = graph.clone();
        for _ in 0..3 {
            assert!(!graph.is_valid_connection(&Connection::new("B", "T")));
            assert!(graph.is_valid_connection(&Connection::new("T", "B")));
        }
        assert_eq!(graph, before);
    }

    #[test]
    fn entry_terminal_and_neighbours() {
        let graph = trigger_chain();
        assert_eq!(graph.entry_nodes().len(), 1);
        assert_eq!(graph.entry_nodes()[0].id().as_str(), "T");
        assert_eq!(graph.terminal_nodes()[0].id().as_str(), "B");
        assert_eq!(graph.outgoers("T")[0].id().as_str(), "A");
        assert_eq!(graph.incomers("B")[0].id().as_str(), "A");
        assert_eq!(graph.trigger_nodes().len(), 1);
    }

    #[test]
    fn validate_reports_problems() {
        assert!(trigger_chain().validate().is_ok());

        let cyclic = WorkflowGraph::from_parts(
            trigger_chain().nodes().to_vec(),
            vec![Edge::new("e1", "A", "B"), Edge::new("e2", "B", "A")],
        );
        assert_eq!(cyclic.validate(), Err(GraphError::CycleDetected));

        let dangling = WorkflowGraph::from_parts(
            vec![node("A", NodeType::Parser)],
            vec![Edge::new("e1", "A", "Z")],
        );
        assert!(matches!(
            dangling.validate(),
            Err(GraphError::DanglingEdge { .. })
        ));
    }

    #[test]
    fn positions_copied_by_id() {
        let graph = trigger_chain();
        let moved = vec![Node::of_type("A", NodeType::Transformer, Position::new(9.0, 9.0))];
        let next = graph.with_positions_from(&moved);

        assert_eq!(next.node("A").map(|n| n.position), Some(Position::new(9.0, 9.0)));
        assert_eq!(next.node("T").map(|n| n.position), Some(Position::default()));
    }

    #[test]
    fn graph_serde_roundtrip() {
        let graph = trigger_chain();
        let json = serde_json::to_string(&graph).expect("serialize");
        let parsed: WorkflowGraph = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, graph);
    }
}
