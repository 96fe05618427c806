//! Editing session controller.
//!
//! The controller owns the graph for one editing session. Host UI gestures
//! (change batches, new connections, palette drops, layout requests) go
//! through it; each accepted gesture replaces the session graph with a new
//! snapshot, and previous snapshots feed undo/redo.
//!
//! Everything the controller needs from its surroundings arrives in an
//! [`EditorContext`] at construction.

use crate::catalog::AgentDefinition;
use crate::change::{EdgeChange, NodeChange};
use crate::edge::{Connection, Edge};
use crate::execution::ExecutionRequest;
use crate::graph::WorkflowGraph;
use crate::layout::{LayoutDirection, LayoutEngine, LayoutOptions};
use crate::node::{Node, NodeData, NodeId, NodeType, Position};
use flowdeck_core::WorkflowId;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of undo snapshots kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Receives view hints from the controller.
pub trait Viewport: Send + Sync {
    /// Asks the host to fit every node into view. Hosts may ignore it.
    fn fit_view(&self);
}

/// A viewport that ignores every hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopViewport;

impl Viewport for NoopViewport {
    fn fit_view(&self) {}
}

/// Session-wide settings and collaborators.
#[derive(Clone)]
pub struct EditorContext {
    pub workflow_id: WorkflowId,
    /// Palette entries used as defaults for new nodes.
    pub palette: Vec<AgentDefinition>,
    pub viewport: Arc<dyn Viewport>,
    pub layout: LayoutOptions,
    /// Maximum number of undo snapshots.
    pub history_limit: usize,
}

impl EditorContext {
    /// Creates a context with an empty palette and a no-op viewport.
    #[must_use]
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id,
            palette: Vec::new(),
            viewport: Arc::new(NoopViewport),
            layout: LayoutOptions::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_palette(mut self, palette: Vec<AgentDefinition>) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Arc<dyn Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Default data for a node of `node_type`, taken from the palette when
    /// it has a usable entry.
    fn default_data(&self, node_type: NodeType) -> NodeData {
        let entry = self.palette.iter().find(|a| a.node_type == node_type);
        match entry.map(AgentDefinition::node_data) {
            Some(Ok(data)) => data,
            Some(Err(err)) => {
                warn!(error = %err, %node_type, "palette defaults rejected, using empty data");
                NodeData::default_for(node_type)
            }
            None => NodeData::default_for(node_type),
        }
    }
}

impl fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorContext")
            .field("workflow_id", &self.workflow_id)
            .field("palette", &self.palette.len())
            .field("layout", &self.layout)
            .field("history_limit", &self.history_limit)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    /// No gesture received yet.
    #[default]
    Idle,
    /// At least one gesture has been handled.
    Editing,
}

/// Mediates user gestures against the session graph.
#[derive(Debug)]
pub struct EditorController {
    context: EditorContext,
    graph: WorkflowGraph,
    state: EditorState,
    undo: VecDeque<WorkflowGraph>,
    redo: Vec<WorkflowGraph>,
}

impl EditorController {
    /// Starts a session on `graph`.
    #[must_use]
    pub fn new(context: EditorContext, graph: WorkflowGraph) -> Self {
        Self {
            context,
            graph,
            state: EditorState::Idle,
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    /// Applies a node change batch from the host UI.
    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) {
        self.state = EditorState::Editing;
        let cosmetic = changes.iter().all(NodeChange::is_cosmetic);
        let next = self.graph.apply_node_changes(changes);
        self.commit(next, cosmetic);
    }

    /// Applies an edge change batch from the host UI.
    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) {
        self.state = EditorState::Editing;
        let cosmetic = changes.iter().all(EdgeChange::is_cosmetic);
        let next = self.graph.apply_edge_changes(changes);
        self.commit(next, cosmetic);
    }

    /// Adds the proposed edge if it is valid. Rejections are silent.
    pub fn on_connect(&mut self, candidate: &Connection) -> Option<Edge> {
        self.state = EditorState::Editing;
        match self.graph.connect(candidate) {
            Ok((next, edge)) => {
                self.commit(next, false);
                Some(edge)
            }
            Err(err) => {
                debug!(error = %err, "connection rejected");
                None
            }
        }
    }

    /// Returns true if `candidate` would be accepted by [`Self::on_connect`].
    #[must_use]
    pub fn is_valid_connection(&self, candidate: &Connection) -> bool {
        self.graph.is_valid_connection(candidate)
    }

    /// Re-positions every node with the layout engine, then asks the
    /// viewport to fit the result.
    pub fn request_layout(&mut self, direction: LayoutDirection) {
        self.state = EditorState::Editing;
        let options = self.context.layout.clone().with_direction(direction);
        let result =
            LayoutEngine::new(options).layout(self.graph.nodes(), self.graph.edges());
        let next = self.graph.with_positions_from(&result.nodes);
        info!(
            workflow_id = %self.context.workflow_id,
            %direction,
            nodes = next.node_count(),
            "applied layout"
        );
        self.commit(next, false);
        self.context.viewport.fit_view();
    }

    /// Drops a new node of `node_type` at `position` and returns its ID.
    pub fn add_node(&mut self, node_type: NodeType, position: Position) -> NodeId {
        let id = NodeId::generate();
        let node = Node::new(id.clone(), self.context.default_data(node_type), position);
        self.on_nodes_change(vec![NodeChange::add(node)]);
        id
    }

    /// Restores the previous snapshot. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(&mut self.graph, previous));
        true
    }

    /// Re-applies the last undone snapshot. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(std::mem::replace(&mut self.graph, next));
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        self.state
    }

    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        self.context.workflow_id
    }

    /// Ends the session and returns the final graph.
    #[must_use]
    pub fn into_graph(self) -> WorkflowGraph {
        self.graph
    }

    /// Packages the current graph for the execution service.
    #[must_use]
    pub fn execution_payload(&self) -> ExecutionRequest {
        ExecutionRequest::new(self.context.workflow_id, &self.graph)
    }

    fn commit(&mut self, next: WorkflowGraph, cosmetic: bool) {
        if next == self.graph {
            return;
        }
        let previous = std::mem::replace(&mut self.graph, next);
        // Redo snapshots predate this edit; replaying one would drop it.
        self.redo.clear();
        if cosmetic || self.context.history_limit == 0 {
            return;
        }
        self.undo.push_back(previous);
        while self.undo.len() > self.context.history_limit {
            self.undo.pop_front();
        }
    }
}
