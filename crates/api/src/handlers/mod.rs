pub mod executions;
pub mod workflows;

use std::sync::Arc;

use engine::WorkflowManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<WorkflowManager>,
}
