//! Workflow canvas core for the flowdeck platform.
//!
//! This crate provides the editing core behind the visual workflow builder:
//!
//! - **Graph Model**: Nodes and edges with typed per-node configuration,
//!   applied through change batches that never mutate the previous snapshot
//! - **Cycle Prevention**: Every proposed edge is checked so the graph stays acyclic
//! - **Layout Engine**: Deterministic layered (Sugiyama-style) auto-layout
//! - **Editor Controller**: Mediates user gestures, trigger protection, undo/redo
//! - **Collaborators**: Persistence, execution and agent catalog interfaces

/// Defines a string-backed identifier chosen by the host UI.
macro_rules! define_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

pub mod catalog;
pub mod change;
pub mod cycle;
pub mod definition;
pub mod edge;
pub mod editor;
pub mod error;
pub mod execution;
pub mod graph;
pub mod layout;
pub mod node;
pub mod store;

pub use catalog::{AgentCatalog, AgentDefinition, StaticAgentCatalog};
pub use change::{EdgeChange, NodeChange};
pub use definition::{Workflow, WorkflowMetadata, WorkflowSummary};
pub use edge::{Connection, Edge, EdgeId};
pub use editor::{EditorContext, EditorController, EditorState, NoopViewport, Viewport};
pub use error::{
    CatalogError, ConnectionError, ExecutionError, GraphError, LayoutError, StoreError,
};
pub use execution::{ExecutionRequest, ExecutionResult, WorkflowExecutor};
pub use graph::WorkflowGraph;
pub use layout::{LayoutDirection, LayoutEngine, LayoutOptions, LayoutResult};
pub use node::{Node, NodeData, NodeId, NodeType, Position};
pub use store::{InMemoryWorkflowStore, WorkflowStore};
