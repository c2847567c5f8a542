//! `engine` crate — the workflow domain model, DAG validation, the
//! bounded-parallel runner, the streaming update bus, and the manager
//! façade that ties persistence to execution.

pub mod error;
pub mod execution;
pub mod manager;
pub mod model;
pub mod runner;
pub mod stream;
pub mod validate;

pub use error::EngineError;
pub use execution::{new_execution_id, NodeExecution, NodeStatus, WorkflowExecution, WorkflowStatus};
pub use manager::WorkflowManager;
pub use model::{Edge, Node, NodeCondition, NodeType, Workflow};
pub use runner::{RunnerConfig, WorkflowRunner};
pub use stream::{UpdateRecord, HEARTBEAT_INTERVAL_MS};
pub use validate::{get_execution_order, validate_workflow};
