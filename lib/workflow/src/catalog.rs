//! Agent catalog: the node palette offered by the canvas.
//!
//! Each [`AgentDefinition`] describes one entry in the palette: which node
//! type it creates, the default configuration new nodes start with and the
//! output handles it exposes.

use crate::error::{CatalogError, GraphError};
use crate::node::{NodeData, NodeType};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// A palette entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Stable identifier of the entry.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Node type created from this entry.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub description: Option<String>,
    /// Data object new nodes start with.
    #[serde(default)]
    pub default_data: Map<String, JsonValue>,
    /// Named output handles. Empty means a single unnamed output.
    #[serde(default)]
    pub handles: Vec<String>,
}

impl AgentDefinition {
    /// Creates a definition with empty default data and the node type's handles.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            description: None,
            default_data: Map::new(),
            handles: node_type
                .output_handles()
                .iter()
                .map(|h| (*h).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets one key of the default data.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.default_data.insert(key.into(), value);
        self
    }

    /// Decodes the default data for a new node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidNodeData`] if the defaults do not fit
    /// the node type.
    pub fn node_data(&self) -> Result<NodeData, GraphError> {
        NodeData::from_json(self.node_type, JsonValue::Object(self.default_data.clone()))
    }
}

/// Source of palette entries.
#[async_trait]
pub trait AgentCatalog: Send + Sync {
    /// Lists the available agent definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be reached or decoded.
    async fn list_agents(&self) -> Result<Vec<AgentDefinition>, Report<CatalogError>>;
}

/// A fixed, in-process catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticAgentCatalog {
    agents: Vec<AgentDefinition>,
}

impl StaticAgentCatalog {
    #[must_use]
    pub fn new(agents: Vec<AgentDefinition>) -> Self {
        Self { agents }
    }

    /// The built-in palette: one entry per node type.
    #[must_use]
    pub fn builtin() -> Self {
        let agents = NodeType::ALL
            .into_iter()
            .map(|node_type| {
                let definition = AgentDefinition::new(
                    node_type.as_str(),
                    builtin_name(node_type),
                    node_type,
                )
                .with_description(builtin_description(node_type))
                .with_default("name", json!(builtin_name(node_type)));
                match node_type {
                    NodeType::AiAgent => definition.with_default("tools", json!([])),
                    NodeType::Parser => definition.with_default("parse_type", json!("json")),
                    _ => definition,
                }
            })
            .collect();
        Self { agents }
    }

    #[must_use]
    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// Returns the first entry creating nodes of `node_type`.
    #[must_use]
    pub fn find(&self, node_type: NodeType) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.node_type == node_type)
    }
}

#[async_trait]
impl AgentCatalog for StaticAgentCatalog {
    async fn list_agents(&self) -> Result<Vec<AgentDefinition>, Report<CatalogError>> {
        Ok(self.agents.clone())
    }
}

fn builtin_name(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Trigger => "Trigger",
        NodeType::Transformer => "Transformer",
        NodeType::Destination => "Destination",
        NodeType::IfThenOr => "If / Then / Or",
        NodeType::AiAgent => "AI Agent",
        NodeType::Webhook => "Webhook",
        NodeType::Parser => "Parser",
    }
}

fn builtin_description(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Trigger => "Starts the workflow",
        NodeType::Transformer => "Reshapes data passing through",
        NodeType::Destination => "Delivers results",
        NodeType::IfThenOr => "Routes data down the then or or branch",
        NodeType::AiAgent => "Runs an LLM agent with instructions and tools",
        NodeType::Webhook => "Calls an HTTP endpoint",
        NodeType::Parser => "Extracts structured data",
    }
}
