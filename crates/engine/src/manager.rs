//! The workflow manager — the façade the `api` and `cli` crates talk
//! to. Owns persistence of workflow definitions (via `db::WorkflowStore`)
//! and delegates execution to a shared `WorkflowRunner`.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use db::{store::new_row, WorkflowStore};

use crate::error::EngineError;
use crate::execution::WorkflowExecution;
use crate::model::Workflow;
use crate::runner::WorkflowRunner;
use crate::stream::UpdateRecord;
use crate::validate::validate_workflow;

pub struct WorkflowManager {
    store: WorkflowStore,
    runner: Arc<WorkflowRunner>,
}

impl WorkflowManager {
    pub fn new(runner: Arc<WorkflowRunner>) -> Self {
        Self { store: WorkflowStore::new(), runner }
    }

    /// Save (or overwrite) a workflow definition. Assigns `workflow_<12
    /// hex>` when `id` is absent; `created_at` is preserved across an
    /// overwrite, `updated_at` is always refreshed.
    pub fn save_workflow(&self, mut workflow: Workflow) -> Workflow {
        if workflow.id.trim().is_empty() {
            let raw = uuid::Uuid::new_v4().simple().to_string();
            workflow.id = format!("workflow_{}", &raw[..12]);
        }
        let created_at = self.store.get(&workflow.id).ok().map(|row| row.created_at);
        let definition = serde_json::to_value(&workflow).expect("Workflow always serializes");
        let row = self.store.save(new_row(workflow.id.clone(), workflow.name.clone(), definition, created_at));

        workflow.settings.insert("created_at".to_string(), json!(row.created_at));
        workflow.settings.insert("updated_at".to_string(), json!(row.updated_at));
        workflow
    }

    pub fn get_workflow(&self, id: &str) -> Result<Workflow, EngineError> {
        let row = self.store.get(id).map_err(|_| EngineError::WorkflowNotFound(id.to_string()))?;
        let mut workflow: Workflow =
            serde_json::from_value(row.definition).expect("stored definition was validated at save time");
        workflow.settings.insert("created_at".to_string(), json!(row.created_at));
        workflow.settings.insert("updated_at".to_string(), json!(row.updated_at));
        Ok(workflow)
    }

    pub fn delete_workflow(&self, id: &str) -> Result<(), EngineError> {
        self.store.delete(id).map_err(|_| EngineError::WorkflowNotFound(id.to_string()))
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.store
            .list()
            .into_iter()
            .filter_map(|row| serde_json::from_value(row.definition).ok())
            .collect()
    }

    /// Validate and run a saved workflow to completion.
    pub async fn run_workflow(&self, id: &str, initial_context: Map<String, Value>) -> Result<WorkflowExecution, EngineError> {
        let workflow = self.load_and_validate(id)?;
        Ok(self.runner.run(workflow, initial_context).await)
    }

    /// Validate and run a saved workflow, returning a live update
    /// stream instead of waiting for completion.
    pub async fn run_workflow_stream(
        &self,
        id: &str,
        initial_context: Map<String, Value>,
    ) -> Result<(String, mpsc::Receiver<UpdateRecord>), EngineError> {
        let workflow = self.load_and_validate(id)?;
        Ok(self.runner.run_stream(workflow, initial_context).await)
    }

    pub async fn get_execution(&self, execution_id: &str) -> Option<WorkflowExecution> {
        self.runner.get_execution(execution_id).await
    }

    pub async fn list_executions(&self, workflow_id: Option<&str>) -> Vec<WorkflowExecution> {
        self.runner.list_executions(workflow_id).await
    }

    pub async fn cancel_execution(&self, execution_id: &str) -> bool {
        self.runner.cancel(execution_id).await
    }

    fn load_and_validate(&self, id: &str) -> Result<Workflow, EngineError> {
        let workflow = self.get_workflow(id)?;
        let errors = validate_workflow(&workflow);
        if !errors.is_empty() {
            return Err(EngineError::ValidationFailed(errors));
        }
        Ok(workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node, NodeType};
    use crate::runner::RunnerConfig;
    use nodes::SkillRegistry;

    fn sample_workflow() -> Workflow {
        Workflow::new("", "demo")
            .with_nodes(vec![
                Node::new("start", "start", NodeType::Trigger),
                Node::new("step", "step", NodeType::Skill).with_skill("http-request"),
            ])
            .with_edges(vec![Edge::new("e1", "start", "step")])
            .with_triggers(vec!["start".to_string()])
    }

    fn manager() -> WorkflowManager {
        let registry = Arc::new(SkillRegistry::with_standard_skills());
        let runner = Arc::new(WorkflowRunner::new(registry, RunnerConfig::default()));
        WorkflowManager::new(runner)
    }

    #[test]
    fn save_assigns_an_id_when_absent() {
        let manager = manager();
        let saved = manager.save_workflow(sample_workflow());
        assert!(saved.id.starts_with("workflow_"));
    }

    #[test]
    fn save_preserves_created_at_across_overwrite() {
        let manager = manager();
        let mut workflow = sample_workflow();
        workflow.id = "wf_fixed".to_string();
        let first = manager.save_workflow(workflow.clone());
        let second = manager.save_workflow(workflow);
        assert_eq!(first.settings["created_at"], second.settings["created_at"]);
    }

    #[test]
    fn get_missing_workflow_errors() {
        let manager = manager();
        assert!(matches!(manager.get_workflow("ghost"), Err(EngineError::WorkflowNotFound(_))));
    }

    #[test]
    fn delete_then_list_no_longer_includes_it() {
        let manager = manager();
        let mut workflow = sample_workflow();
        workflow.id = "wf_delete_me".to_string();
        manager.save_workflow(workflow);
        manager.delete_workflow("wf_delete_me").unwrap();
        assert!(manager.list_workflows().iter().all(|w| w.id != "wf_delete_me"));
    }

    #[tokio::test]
    async fn run_workflow_rejects_invalid_definitions() {
        let manager = manager();
        let mut workflow = Workflow::new("wf_invalid", "broken");
        workflow.id = "wf_invalid".to_string();
        manager.save_workflow(workflow);
        let result = manager.run_workflow("wf_invalid", Map::new()).await;
        assert!(matches!(result, Err(EngineError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn run_workflow_executes_a_saved_workflow() {
        let manager = manager();
        let mut workflow = sample_workflow();
        workflow.id = "wf_runnable".to_string();
        manager.save_workflow(workflow);

        let execution = manager.run_workflow("wf_runnable", Map::new()).await.unwrap();
        assert_eq!(execution.node_executions.len(), 2);
    }
}
