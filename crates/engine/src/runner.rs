//! The workflow runner — bounded-parallel ready-set scheduler.
//!
//! `WorkflowRunner` is the central orchestrator:
//! 1. Computes the dependency set of every node from the workflow's edges.
//! 2. Repeatedly dispatches the nodes whose dependencies have all
//!    terminated, up to `max_parallel_nodes` concurrently.
//! 3. Resolves each node's skill via the registry, synthesizes its
//!    inputs from upstream outputs, and invokes it under a per-skill
//!    retry + timeout envelope.
//! 4. Persists every node's result into the owning `WorkflowExecution`
//!    and, for `run_stream`, forwards a terminal-transition event.
//! 5. Reaches a terminal status (`completed`, `failed`, `cancelled`) and
//!    retains the execution in its table for later lookup.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use nodes::{ExecutionContext, NodesError, Skill, SkillDefinition, SkillRegistry, SkillResult};

use crate::error::EngineError;
use crate::execution::{new_execution_id, NodeExecution, NodeStatus, WorkflowExecution, WorkflowStatus};
use crate::model::{Node, Workflow};
use crate::stream::UpdateRecord;

/// Tuning knobs for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum number of nodes executing concurrently within a single
    /// workflow execution.
    pub max_parallel_nodes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_parallel_nodes: 5 }
    }
}

/// Why the scheduling loop stopped.
enum LoopOutcome {
    Completed,
    Deadlock,
    Cancelled,
}

/// Bounded-parallel DAG scheduler. Cheap to clone — every field is an
/// `Arc`, so a clone shares the same registry and execution table.
#[derive(Clone)]
pub struct WorkflowRunner {
    registry: Arc<SkillRegistry>,
    executions: Arc<Mutex<HashMap<String, WorkflowExecution>>>,
    cancellations: Arc<Mutex<HashMap<String, CancellationToken>>>,
    config: RunnerConfig,
}

impl WorkflowRunner {
    pub fn new(registry: Arc<SkillRegistry>, config: RunnerConfig) -> Self {
        Self {
            registry,
            executions: Arc::new(Mutex::new(HashMap::new())),
            cancellations: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Run `workflow` to completion and return the final execution
    /// record.
    #[instrument(skip(self, workflow, initial_context), fields(workflow_id = %workflow.id))]
    pub async fn run(&self, workflow: Workflow, initial_context: Map<String, Value>) -> WorkflowExecution {
        let workflow = Arc::new(workflow);
        let execution_id = new_execution_id();
        let cancellation = CancellationToken::new();
        self.cancellations
            .lock()
            .await
            .insert(execution_id.clone(), cancellation.clone());

        self.execute_loop(workflow, execution_id, initial_context, cancellation, None).await
    }

    /// Run `workflow`, returning immediately with the execution id and a
    /// receiver of lifecycle updates. Exactly one observer is supported
    /// per execution; a second caller must poll `get_execution` instead.
    #[instrument(skip(self, workflow, initial_context), fields(workflow_id = %workflow.id))]
    pub async fn run_stream(
        &self,
        workflow: Workflow,
        initial_context: Map<String, Value>,
    ) -> (String, mpsc::Receiver<UpdateRecord>) {
        let workflow = Arc::new(workflow);
        let execution_id = new_execution_id();
        let cancellation = CancellationToken::new();
        self.cancellations
            .lock()
            .await
            .insert(execution_id.clone(), cancellation.clone());

        let (tx, rx) = mpsc::channel(256);
        let _ = tx
            .send(UpdateRecord::ExecutionStart {
                execution_id: execution_id.clone(),
                workflow_id: workflow.id.clone(),
            })
            .await;

        let this = self.clone();
        let exec_id = execution_id.clone();
        tokio::spawn(async move {
            this.execute_loop(workflow, exec_id, initial_context, cancellation, Some(tx)).await;
        });

        (execution_id, rx)
    }

    /// Cancel a running execution. Returns whether a transition
    /// occurred (false if the execution doesn't exist or has already
    /// reached a terminal state).
    pub async fn cancel(&self, execution_id: &str) -> bool {
        {
            let mut executions = self.executions.lock().await;
            let Some(execution) = executions.get_mut(execution_id) else {
                return false;
            };
            if execution.status != WorkflowStatus::Running {
                return false;
            }
            execution.status = WorkflowStatus::Cancelled;
        }

        if let Some(token) = self.cancellations.lock().await.get(execution_id) {
            token.cancel();
        }
        true
    }

    pub async fn get_execution(&self, execution_id: &str) -> Option<WorkflowExecution> {
        self.executions.lock().await.get(execution_id).cloned()
    }

    pub async fn list_executions(&self, workflow_id: Option<&str>) -> Vec<WorkflowExecution> {
        self.executions
            .lock()
            .await
            .values()
            .filter(|e| workflow_id.map(|id| id == e.workflow_id).unwrap_or(true))
            .cloned()
            .collect()
    }

    async fn store(&self, execution: WorkflowExecution) {
        self.executions
            .lock()
            .await
            .insert(execution.execution_id.clone(), execution);
    }

    async fn emit(&self, updates: &Option<mpsc::Sender<UpdateRecord>>, record: UpdateRecord) {
        if let Some(tx) = updates {
            let _ = tx.send(record).await;
        }
    }

    /// The ready-set scheduling loop described in the core's design doc.
    async fn execute_loop(
        &self,
        workflow: Arc<Workflow>,
        execution_id: String,
        initial_context: Map<String, Value>,
        cancellation: CancellationToken,
        updates: Option<mpsc::Sender<UpdateRecord>>,
    ) -> WorkflowExecution {
        let mut execution = WorkflowExecution::new(execution_id, workflow.id.clone());
        execution.status = WorkflowStatus::Running;
        execution.started_at = Some(Utc::now());
        for node in &workflow.nodes {
            execution
                .node_executions
                .insert(node.id.clone(), NodeExecution::pending(&node.id));
        }
        self.store(execution.clone()).await;

        let dependencies: HashMap<String, HashSet<String>> = workflow
            .nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    workflow.dependencies_of(&n.id).into_iter().map(String::from).collect(),
                )
            })
            .collect();

        let total = workflow.nodes.len();
        let mut completed: HashSet<String> = HashSet::new();
        let mut running: HashSet<String> = HashSet::new();
        let mut join_set: JoinSet<(String, SkillResult, u32)> = JoinSet::new();

        let outcome = loop {
            if cancellation.is_cancelled() {
                break LoopOutcome::Cancelled;
            }
            if completed.len() == total {
                break LoopOutcome::Completed;
            }

            let ready: Vec<String> = workflow
                .nodes
                .iter()
                .map(|n| n.id.clone())
                .filter(|id| {
                    !completed.contains(id)
                        && !running.contains(id)
                        && dependencies[id].iter().all(|d| completed.contains(d))
                })
                .collect();

            if ready.is_empty() && running.is_empty() {
                break LoopOutcome::Deadlock;
            }

            // Triggers and unresolvable skills settle in-band; they
            // never occupy a parallel execution slot.
            let mut spawnable = Vec::new();
            for node_id in ready {
                let node = workflow.nodes.iter().find(|n| n.id == node_id).expect("node in workflow");

                if node.is_trigger() {
                    self.settle(&mut execution, node, NodeStatus::Success, Map::new(), None, Vec::new(), 0, 0, &updates)
                        .await;
                    completed.insert(node_id);
                    continue;
                }

                let skill_id = match &node.skill_id {
                    Some(id) => match self.registry.resolve(id) {
                        Ok(_) => id.clone(),
                        Err(NodesError::SkillNotFound(id)) => {
                            self.settle(
                                &mut execution,
                                node,
                                NodeStatus::Failed,
                                Map::new(),
                                Some(EngineError::SkillNotFound(id).to_string()),
                                Vec::new(),
                                0,
                                0,
                                &updates,
                            )
                            .await;
                            completed.insert(node_id);
                            continue;
                        }
                    },
                    None => {
                        self.settle(
                            &mut execution,
                            node,
                            NodeStatus::Failed,
                            Map::new(),
                            Some(EngineError::SkillNotFound(node_id.clone()).to_string()),
                            Vec::new(),
                            0,
                            0,
                            &updates,
                        )
                        .await;
                        completed.insert(node_id);
                        continue;
                    }
                };

                spawnable.push((node_id, skill_id));
            }

            let capacity = self.config.max_parallel_nodes.saturating_sub(running.len());
            for (node_id, skill_id) in spawnable.into_iter().take(capacity) {
                let node = workflow
                    .nodes
                    .iter()
                    .find(|n| n.id == node_id)
                    .cloned()
                    .expect("node in workflow");

                running.insert(node_id.clone());
                {
                    let ne = execution.node_executions.get_mut(&node_id).expect("node execution exists");
                    ne.status = NodeStatus::Running;
                    ne.started_at = Some(Utc::now());
                }

                let inputs = synthesize_inputs(&node, &workflow, &execution);
                let previous_outputs = previous_outputs_map(&workflow, &execution, &completed);
                execution
                    .node_executions
                    .get_mut(&node_id)
                    .expect("node execution exists")
                    .inputs = inputs.clone();

                let ctx = ExecutionContext {
                    workflow_id: workflow.id.clone(),
                    node_id: node_id.clone(),
                    inputs,
                    previous_outputs,
                    config: initial_context.clone(),
                    sandbox_path: None,
                    env_vars: HashMap::new(),
                    cancellation: cancellation.clone(),
                };

                let skill = self.registry.get(&skill_id).expect("resolved above");
                join_set.spawn(async move {
                    let (result, retries) = run_skill_with_retry(skill, &ctx).await;
                    (node_id, result, retries)
                });
            }

            if running.is_empty() {
                continue;
            }

            match tokio::time::timeout(Duration::from_millis(100), join_set.join_next()).await {
                Ok(Some(Ok((node_id, result, retries)))) => {
                    running.remove(&node_id);
                    completed.insert(node_id.clone());
                    self.apply_result(&mut execution, &node_id, result, retries, &updates).await;
                }
                Ok(Some(Err(join_err))) => {
                    warn!(error = %join_err, "node task panicked");
                }
                Ok(None) | Err(_) => {
                    // Nothing finished within the idle tick; loop and
                    // re-check cancellation / readiness.
                }
            }
        };

        match outcome {
            LoopOutcome::Completed => execution.status = WorkflowStatus::Completed,
            LoopOutcome::Deadlock => {
                execution.status = WorkflowStatus::Failed;
                execution.error = Some(EngineError::Deadlock.to_string());
            }
            LoopOutcome::Cancelled => execution.status = WorkflowStatus::Cancelled,
        }
        execution.completed_at = Some(Utc::now());
        self.store(execution.clone()).await;
        self.emit(
            &updates,
            UpdateRecord::ExecutionComplete {
                execution_id: execution.execution_id.clone(),
                status: execution.status,
                error: execution.error.clone(),
            },
        )
        .await;

        execution
    }

    /// Apply an in-band terminal transition (trigger success, or a
    /// skill-resolution failure) without going through the retry/
    /// timeout envelope.
    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        execution: &mut WorkflowExecution,
        node: &Node,
        status: NodeStatus,
        outputs: Map<String, Value>,
        error: Option<String>,
        logs: Vec<String>,
        duration_ms: u64,
        retry_count: u32,
        updates: &Option<mpsc::Sender<UpdateRecord>>,
    ) {
        let now = Utc::now();
        if let Some(ne) = execution.node_executions.get_mut(&node.id) {
            ne.status = status;
            ne.started_at.get_or_insert(now);
            ne.completed_at = Some(now);
            ne.outputs = outputs.clone();
            ne.error = error.clone();
            ne.logs = logs.clone();
            ne.duration_ms = duration_ms;
            ne.retry_count = retry_count;
        }
        execution.context.insert(node.id.clone(), outputs.clone());
        self.store(execution.clone()).await;
        self.emit(
            updates,
            UpdateRecord::NodeUpdate {
                execution_id: execution.execution_id.clone(),
                node_id: node.id.clone(),
                status,
                outputs,
                error,
                logs: truncate_logs(&logs),
            },
        )
        .await;
    }

    /// Apply the outcome of a skill invocation that went through the
    /// retry/timeout envelope.
    async fn apply_result(
        &self,
        execution: &mut WorkflowExecution,
        node_id: &str,
        result: SkillResult,
        retries_used: u32,
        updates: &Option<mpsc::Sender<UpdateRecord>>,
    ) {
        let now = Utc::now();
        let status = if result.is_success() { NodeStatus::Success } else { NodeStatus::Failed };
        if let Some(ne) = execution.node_executions.get_mut(node_id) {
            ne.status = status;
            ne.completed_at = Some(now);
            ne.outputs = result.outputs.clone();
            ne.error = result.error.clone();
            ne.logs = result.logs.clone();
            ne.duration_ms = result.duration_ms;
            ne.retry_count = retries_used;
        }
        execution.context.insert(node_id.to_string(), result.outputs.clone());
        self.store(execution.clone()).await;
        self.emit(
            updates,
            UpdateRecord::NodeUpdate {
                execution_id: execution.execution_id.clone(),
                node_id: node_id.to_string(),
                status,
                outputs: result.outputs,
                error: result.error,
                logs: truncate_logs(&result.logs),
            },
        )
        .await;
    }
}

/// At most `1 + skill.definition().retry_count` attempts, each bounded
/// by the skill's own timeout, with `2^attempt` backoff between
/// failures. Returns the final `SkillResult` and how many retries it
/// took.
async fn run_skill_with_retry(skill: Box<dyn Skill>, ctx: &ExecutionContext) -> (SkillResult, u32) {
    let definition = skill.definition().clone();
    let mut attempt = 0u32;
    let mut retries_used = 0u32;

    loop {
        let result = run_with_timeout(skill.as_ref(), &definition, ctx).await;
        if result.is_success() {
            return (result, retries_used);
        }

        retries_used += 1;
        if attempt >= definition.retry_count {
            let mut result = result;
            result.error = Some(
                EngineError::NodeRetryExhausted {
                    node_id: ctx.node_id.clone(),
                    message: result.error.clone().unwrap_or_default(),
                }
                .to_string(),
            );
            return (result, retries_used);
        }

        let delay = Duration::from_secs(2u64.saturating_pow(attempt));
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = ctx.cancellation.cancelled() => {}
        }
        attempt += 1;
    }
}

async fn run_with_timeout(skill: &dyn Skill, definition: &SkillDefinition, ctx: &ExecutionContext) -> SkillResult {
    match tokio::time::timeout(Duration::from_secs(definition.timeout_seconds), skill.execute(ctx)).await {
        Ok(result) => result,
        Err(_) => SkillResult::failure(
            format!("Execution timed out after {}s", definition.timeout_seconds),
            definition.timeout_seconds * 1000,
        )
        .with_logs(vec![format!("node exceeded timeout of {}s", definition.timeout_seconds)]),
    }
}

/// Start with a copy of the node's own parameters; for every node that
/// has reached a terminal state, fill in any output key still absent.
/// Explicit node parameters always win.
fn synthesize_inputs(node: &Node, workflow: &Workflow, execution: &WorkflowExecution) -> Map<String, Value> {
    let mut inputs = node.parameters.clone();
    for other in &workflow.nodes {
        let Some(ne) = execution.node_executions.get(&other.id) else { continue };
        if !ne.is_terminal() {
            continue;
        }
        for (key, value) in &ne.outputs {
            inputs.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    inputs
}

/// `previous_outputs` per the execution contract: every completed
/// node's outputs, keyed by node id.
fn previous_outputs_map(
    workflow: &Workflow,
    execution: &WorkflowExecution,
    completed: &HashSet<String>,
) -> HashMap<String, Map<String, Value>> {
    workflow
        .nodes
        .iter()
        .filter(|n| completed.contains(&n.id))
        .filter_map(|n| execution.node_executions.get(&n.id).map(|ne| (n.id.clone(), ne.outputs.clone())))
        .collect()
}

fn truncate_logs(logs: &[String]) -> Vec<String> {
    let start = logs.len().saturating_sub(5);
    logs[start..].to_vec()
}
