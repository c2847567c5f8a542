//! The streaming update bus.
//!
//! A single observer per execution receives an `mpsc::Receiver<UpdateRecord>`
//! from `WorkflowRunner::run_stream`. Events arrive as the runner
//! transitions nodes; when nothing has happened for the heartbeat
//! interval, the consumer side (the `api` crate's SSE handler) emits a
//! `Heartbeat` of its own so the HTTP connection doesn't look dead to
//! proxies sitting between the client and the server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::execution::{NodeStatus, WorkflowStatus};

/// How long a stream consumer waits for the next event before emitting
/// a synthetic heartbeat instead.
pub const HEARTBEAT_INTERVAL_MS: u64 = 500;

/// One message on an execution's update channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateRecord {
    ExecutionStart {
        execution_id: String,
        workflow_id: String,
    },
    NodeUpdate {
        execution_id: String,
        node_id: String,
        status: NodeStatus,
        outputs: Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        logs: Vec<String>,
    },
    /// Synthesized by the consumer, never by the runner, when no other
    /// event has arrived within `HEARTBEAT_INTERVAL_MS`.
    Heartbeat { execution_id: String },
    ExecutionComplete {
        execution_id: String,
        status: WorkflowStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl UpdateRecord {
    pub fn execution_id(&self) -> &str {
        match self {
            UpdateRecord::ExecutionStart { execution_id, .. }
            | UpdateRecord::NodeUpdate { execution_id, .. }
            | UpdateRecord::Heartbeat { execution_id }
            | UpdateRecord::ExecutionComplete { execution_id, .. } => execution_id,
        }
    }
}
