//! Core domain model: `Workflow`, `Node`, `Edge`.
//!
//! These are the source of truth for what a workflow looks like in
//! memory and are what the [`crate::validate`] and [`crate::runner`]
//! modules operate over. Serializable as-is for the HTTP façade and the
//! n8n importer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What kind of step a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Trigger,
    Skill,
    Condition,
    Merge,
    Output,
}

/// One branch of a `Condition` node: `{type, left, right, output}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub left: Value,
    pub right: Value,
    pub output: u32,
}

/// A single step in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub position: (i64, i64),
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            skill_id: None,
            parameters: Map::new(),
            position: (0, 0),
            connections: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn with_skill(mut self, skill_id: impl Into<String>) -> Self {
        self.skill_id = Some(skill_id.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_position(mut self, x: i64, y: i64) -> Self {
        self.position = (x, y);
        self
    }

    pub fn is_trigger(&self) -> bool {
        self.node_type == NodeType::Trigger
    }
}

/// A directed edge from one node to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub output_index: u32,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            output_index: 0,
        }
    }
}

/// A complete workflow definition. Immutable during execution — the
/// runner only ever reads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            triggers: Vec::new(),
            settings: Map::new(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_triggers(mut self, triggers: Vec<String>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Dependency set of `node_id`: every node with an edge targeting it.
    pub fn dependencies_of(&self, node_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .map(|e| e.source.as_str())
            .collect()
    }
}
