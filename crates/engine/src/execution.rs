//! Runtime records produced while a workflow runs.
//!
//! [`WorkflowExecution`] is created by the runner when a run starts and
//! is exclusively owned by it until terminal; after that it is retained
//! in the runner's execution table, readable by callers but never
//! mutated again.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Queued,
    Running,
    Success,
    Failed,
    /// Reserved for future conditional-edge support; this engine never
    /// constructs this variant itself.
    Skipped,
}

/// Per-run, per-node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecution {
    pub node_id: String,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub inputs: Map<String, Value>,
    pub outputs: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub retry_count: u32,
    pub duration_ms: u64,
}

impl NodeExecution {
    pub fn pending(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Pending,
            started_at: None,
            completed_at: None,
            inputs: Map::new(),
            outputs: Map::new(),
            error: None,
            logs: Vec::new(),
            retry_count: 0,
            duration_ms: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, NodeStatus::Success | NodeStatus::Failed | NodeStatus::Skipped)
    }
}

/// One run of a workflow, identified by `execution_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: WorkflowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub node_executions: HashMap<String, NodeExecution>,
    pub context: HashMap<String, Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowExecution {
    pub fn new(execution_id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            workflow_id: workflow_id.into(),
            status: WorkflowStatus::Pending,
            started_at: None,
            completed_at: None,
            node_executions: HashMap::new(),
            context: HashMap::new(),
            error: None,
        }
    }
}

/// Generates a fresh execution id of the form `exec_<12 hex chars>`.
pub fn new_execution_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("exec_{}", &raw[..12])
}
