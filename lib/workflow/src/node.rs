//! Canvas node types and configurations.
//!
//! Every node has:
//! - A unique ID chosen by the host UI (never changes after creation)
//! - A type (trigger, transformer, destination, ifthenor, ai-agent, webhook, parser)
//!   that also never changes
//! - Configuration data whose shape is determined by the type
//! - A position on the canvas
//!
//! On the wire a node is `{ id, type, data, position }`. The `data` object is
//! decoded into the [`NodeData`] variant selected by the sibling `type` field,
//! with keys the shape does not know about kept in an `extra` map.

use crate::error::GraphError;
use flowdeck_core::generated_id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

define_string_id!(
    /// A unique identifier for a node within a workflow canvas.
    NodeId
);

impl NodeId {
    /// Generates a fresh node ID for palette gestures.
    #[must_use]
    pub fn generate() -> Self {
        Self(generated_id("node"))
    }
}

/// The type of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// Entry point that starts the workflow. Protected from deletion.
    #[serde(rename = "trigger")]
    Trigger,
    /// Reshapes data flowing through the workflow.
    #[serde(rename = "transformer")]
    Transformer,
    /// Terminal sink that delivers data somewhere.
    #[serde(rename = "destination")]
    Destination,
    /// Conditional branch with `then` and `or` outputs.
    #[serde(rename = "ifthenor")]
    IfThenOr,
    /// LLM-driven agent step.
    #[serde(rename = "ai-agent")]
    AiAgent,
    /// Outbound HTTP webhook call.
    #[serde(rename = "webhook")]
    Webhook,
    /// Parses structured content out of its input.
    #[serde(rename = "parser")]
    Parser,
}

impl NodeType {
    /// All node types, in palette order.
    pub const ALL: [NodeType; 7] = [
        NodeType::Trigger,
        NodeType::Transformer,
        NodeType::Destination,
        NodeType::IfThenOr,
        NodeType::AiAgent,
        NodeType::Webhook,
        NodeType::Parser,
    ];

    /// Returns the wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Transformer => "transformer",
            Self::Destination => "destination",
            Self::IfThenOr => "ifthenor",
            Self::AiAgent => "ai-agent",
            Self::Webhook => "webhook",
            Self::Parser => "parser",
        }
    }

    /// Returns true for trigger nodes.
    #[must_use]
    pub const fn is_trigger(&self) -> bool {
        matches!(self, Self::Trigger)
    }

    /// Output handles exposed by nodes of this type.
    ///
    /// An empty list means the node has a single unnamed output.
    #[must_use]
    pub fn output_handles(&self) -> &'static [&'static str] {
        match self {
            Self::IfThenOr => &["then", "or"],
            _ => &[],
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GraphError::UnknownNodeType {
                name: s.to_string(),
            })
    }
}

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Configuration shared by trigger, transformer and destination nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepData {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Step-specific configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<JsonValue>,
    /// Keys this shape does not know about.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Configuration for if-then-or branch nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Condition routing to the `then` handle; everything else goes to `or`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Configuration for AI agent nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// System-level instructions for the agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Tool names the agent may call.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    /// Prompt template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Configuration for webhook nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Target URL; must be http or https when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Configuration for parser nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parser kind (e.g. "json", "csv", "regex").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_type: Option<String>,
    /// Parser-specific options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_config: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Configuration for a node, one shape per node type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Trigger(StepData),
    Transformer(StepData),
    Destination(StepData),
    IfThenOr(BranchData),
    AiAgent(AgentData),
    Webhook(WebhookData),
    Parser(ParserData),
}

impl NodeData {
    /// Returns empty configuration for the given type.
    #[must_use]
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Trigger => Self::Trigger(StepData::default()),
            NodeType::Transformer => Self::Transformer(StepData::default()),
            NodeType::Destination => Self::Destination(StepData::default()),
            NodeType::IfThenOr => Self::IfThenOr(BranchData::default()),
            NodeType::AiAgent => Self::AiAgent(AgentData::default()),
            NodeType::Webhook => Self::Webhook(WebhookData::default()),
            NodeType::Parser => Self::Parser(ParserData::default()),
        }
    }

    /// Decodes and validates configuration for the given type.
    ///
    /// `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidNodeData`] if the value is not an object,
    /// a known key has the wrong shape, or a field fails validation.
    pub fn from_json(node_type: NodeType, value: JsonValue) -> Result<Self, GraphError> {
        let value = match value {
            JsonValue::Null => JsonValue::Object(Map::new()),
            object @ JsonValue::Object(_) => object,
            other => {
                return Err(GraphError::InvalidNodeData {
                    node_type,
                    reason: format!("expected an object, got {other}"),
                });
            }
        };
        let invalid = |e: serde_json::Error| GraphError::InvalidNodeData {
            node_type,
            reason: e.to_string(),
        };

        let data = match node_type {
            NodeType::Trigger => Self::Trigger(serde_json::from_value(value).map_err(invalid)?),
            NodeType::Transformer => {
                Self::Transformer(serde_json::from_value(value).map_err(invalid)?)
            }
            NodeType::Destination => {
                Self::Destination(serde_json::from_value(value).map_err(invalid)?)
            }
            NodeType::IfThenOr => Self::IfThenOr(serde_json::from_value(value).map_err(invalid)?),
            NodeType::AiAgent => Self::AiAgent(serde_json::from_value(value).map_err(invalid)?),
            NodeType::Webhook => Self::Webhook(serde_json::from_value(value).map_err(invalid)?),
            NodeType::Parser => Self::Parser(serde_json::from_value(value).map_err(invalid)?),
        };
        data.validate()?;
        Ok(data)
    }

    /// Encodes this configuration as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let encoded = match self {
            Self::Trigger(d) | Self::Transformer(d) | Self::Destination(d) => {
                serde_json::to_value(d)
            }
            Self::IfThenOr(d) => serde_json::to_value(d),
            Self::AiAgent(d) => serde_json::to_value(d),
            Self::Webhook(d) => serde_json::to_value(d),
            Self::Parser(d) => serde_json::to_value(d),
        };
        // Plain structs of strings and JSON values always encode.
        encoded.unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }

    /// Returns a copy with `patch` merged over the current keys.
    ///
    /// The node type is kept; unknown keys land in `extra`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidNodeData`] if the merged object no longer
    /// fits the shape of this node type.
    pub fn merge(&self, patch: &Map<String, JsonValue>) -> Result<Self, GraphError> {
        let mut merged = match self.to_json() {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        Self::from_json(self.node_type(), JsonValue::Object(merged))
    }

    /// Returns the node type this configuration belongs to.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Trigger(_) => NodeType::Trigger,
            Self::Transformer(_) => NodeType::Transformer,
            Self::Destination(_) => NodeType::Destination,
            Self::IfThenOr(_) => NodeType::IfThenOr,
            Self::AiAgent(_) => NodeType::AiAgent,
            Self::Webhook(_) => NodeType::Webhook,
            Self::Parser(_) => NodeType::Parser,
        }
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Trigger(d) | Self::Transformer(d) | Self::Destination(d) => d.name.as_deref(),
            Self::IfThenOr(d) => d.name.as_deref(),
            Self::AiAgent(d) => d.name.as_deref(),
            Self::Webhook(d) => d.name.as_deref(),
            Self::Parser(d) => d.name.as_deref(),
        }
    }

    /// Returns the keys not covered by this node type's shape.
    #[must_use]
    pub fn extra(&self) -> &Map<String, JsonValue> {
        match self {
            Self::Trigger(d) | Self::Transformer(d) | Self::Destination(d) => &d.extra,
            Self::IfThenOr(d) => &d.extra,
            Self::AiAgent(d) => &d.extra,
            Self::Webhook(d) => &d.extra,
            Self::Parser(d) => &d.extra,
        }
    }

    fn validate(&self) -> Result<(), GraphError> {
        match self {
            Self::Webhook(WebhookData {
                webhook_url: Some(url),
                ..
            }) if !url.is_empty()
                && !url.starts_with("http://")
                && !url.starts_with("https://") =>
            {
                Err(GraphError::InvalidNodeData {
                    node_type: NodeType::Webhook,
                    reason: format!("webhook_url must be an http(s) URL, got '{url}'"),
                })
            }
            Self::AiAgent(AgentData { tools, .. }) if tools.iter().any(|t| t.trim().is_empty()) => {
                Err(GraphError::InvalidNodeData {
                    node_type: NodeType::AiAgent,
                    reason: "tool names must not be empty".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A workflow canvas node.
///
/// The ID and type are fixed at construction; only data and position change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireNode", into = "WireNode")]
pub struct Node {
    id: NodeId,
    data: NodeData,
    /// Top-left corner on the canvas.
    pub position: Position,
    /// Selection flag reported by the host UI. Never serialized.
    pub selected: bool,
}

impl Node {
    /// Creates a node from already-validated configuration.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, data: NodeData, position: Position) -> Self {
        Self {
            id: id.into(),
            data,
            position,
            selected: false,
        }
    }

    /// Creates a node of the given type with empty configuration.
    #[must_use]
    pub fn of_type(id: impl Into<NodeId>, node_type: NodeType, position: Position) -> Self {
        Self::new(id, NodeData::default_for(node_type), position)
    }

    /// Creates a node from a raw JSON data object, validating it for `node_type`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidNodeData`] if the data does not fit the type.
    pub fn from_json_data(
        id: impl Into<NodeId>,
        node_type: NodeType,
        data: JsonValue,
        position: Position,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(id, NodeData::from_json(node_type, data)?, position))
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Returns true if this is a trigger node.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.node_type().is_trigger()
    }

    /// Returns a copy of this node with `patch` merged into its data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidNodeData`] if the merged data is invalid.
    pub fn with_merged_data(&self, patch: &Map<String, JsonValue>) -> Result<Self, GraphError> {
        Ok(Self {
            data: self.data.merge(patch)?,
            ..self.clone()
        })
    }
}

/// Wire representation of a node.
#[derive(Serialize, Deserialize)]
struct WireNode {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    data: JsonValue,
    #[serde(default)]
    position: Position,
}

impl TryFrom<WireNode> for Node {
    type Error = GraphError;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        Node::from_json_data(wire.id, wire.node_type, wire.data, wire.position)
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        Self {
            node_type: node.node_type(),
            data: node.data.to_json(),
            id: node.id,
            position: node.position,
        }
    }
}
