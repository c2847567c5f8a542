//! Engine-level error types.

use thiserror::Error;

/// Errors the runner itself can hit once past validation — a single
/// fault that aborts dispatch for the whole execution. Multi-error
/// structural validation lives in [`crate::validate::validate_workflow`]
/// and returns `Vec<String>` instead, per the spec's error taxonomy.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the workflow.
    #[error("edge references unknown {side} node: '{node_id}'")]
    UnknownNodeReference { node_id: String, side: &'static str },

    /// Topological sort detected a cycle.
    #[error("workflow graph contains a cycle")]
    CycleDetected,

    /// No registered skill matches the node's `skill_id`.
    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    /// A node's retries were exhausted without success.
    #[error("node '{node_id}' exceeded retry limit: {message}")]
    NodeRetryExhausted { node_id: String, message: String },

    /// The ready-set loop stalled: no node is ready and none is running,
    /// but the execution hasn't completed every node.
    #[error("Workflow deadlock detected")]
    Deadlock,

    /// The requested workflow id is not in the manager's store.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// `validate_workflow` found one or more structural problems; the
    /// manager refuses to run a workflow in this state.
    #[error("workflow failed validation: {0:?}")]
    ValidationFailed(Vec<String>),
}
