//! Per-invocation types passed into and returned out of a skill.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Everything a skill needs to run a single node of a single execution.
///
/// Built fresh by the runner for every node dispatch; skills read from it
/// but never write back through it — outputs flow back through the
/// returned [`SkillResult`] instead.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workflow_id: String,
    pub node_id: String,
    pub inputs: Map<String, Value>,
    /// node_id → that node's outputs, for every node that has reached a
    /// terminal state so far in this execution.
    pub previous_outputs: HashMap<String, Map<String, Value>>,
    pub config: Map<String, Value>,
    pub sandbox_path: Option<String>,
    pub env_vars: HashMap<String, String>,
    /// Signalled when the owning workflow execution is cancelled; a
    /// long-running skill should poll this at its suspension points and
    /// return promptly once it is cancelled.
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(workflow_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            node_id: node_id.into(),
            inputs: Map::new(),
            previous_outputs: HashMap::new(),
            config: Map::new(),
            sandbox_path: None,
            env_vars: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }
}

/// Terminal outcome of a single skill invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Success,
    Failed,
}

/// What a skill hands back to the scheduler. Never an `Err` — failure is
/// data carried in `status`/`error`, per the execution contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillResult {
    pub status: SkillStatus,
    pub outputs: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub duration_ms: u64,
}

impl SkillResult {
    pub fn success(outputs: Map<String, Value>, duration_ms: u64) -> Self {
        Self {
            status: SkillStatus::Success,
            outputs,
            error: None,
            logs: Vec::new(),
            duration_ms,
        }
    }

    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status: SkillStatus::Failed,
            outputs: Map::new(),
            error: Some(error.into()),
            logs: Vec::new(),
            duration_ms,
        }
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = logs;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == SkillStatus::Success
    }
}
