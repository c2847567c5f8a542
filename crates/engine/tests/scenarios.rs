//! End-to-end scheduler scenarios: linear success, parallel diamond,
//! failure propagation, timeout+retry, and cancellation.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use engine::{Edge, Node, NodeStatus, NodeType, RunnerConfig, Workflow, WorkflowRunner, WorkflowStatus};
use nodes::mock::MockSkill;
use nodes::{ExecutionContext, Skill, SkillCategory, SkillDefinition, SkillRegistry, SkillResult};

fn trigger(id: &str) -> Node {
    Node::new(id, id, NodeType::Trigger)
}

fn skill_node(id: &str, skill_id: &str) -> Node {
    Node::new(id, id, NodeType::Skill).with_skill(skill_id)
}

/// Records the wall-clock span of every invocation it receives, so
/// tests can assert two nodes genuinely overlapped in time.
struct TimingSkill {
    definition: SkillDefinition,
    delay: Duration,
    spans: Arc<Mutex<Vec<(String, Instant, Instant)>>>,
}

#[async_trait]
impl Skill for TimingSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ExecutionContext) -> SkillResult {
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        let end = Instant::now();
        self.spans.lock().unwrap().push((ctx.node_id.clone(), start, end));
        SkillResult::success(Map::new(), self.delay.as_millis() as u64)
    }
}

#[tokio::test]
async fn s1_linear_workflow_completes_in_order() {
    let registry = SkillRegistry::with_standard_skills();
    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig::default());

    let workflow = Workflow::new("wf_s1", "linear")
        .with_nodes(vec![
            trigger("a"),
            skill_node("b", "http-request"),
            skill_node("c", "file-manager"),
        ])
        .with_edges(vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c")])
        .with_triggers(vec!["a".to_string()]);

    let execution = runner.run(workflow, Map::new()).await;

    assert_eq!(execution.status, WorkflowStatus::Completed);
    for node_id in ["a", "b", "c"] {
        let ne = &execution.node_executions[node_id];
        assert_eq!(ne.status, NodeStatus::Success);
        assert!(ne.completed_at.is_some());
    }
    assert_eq!(execution.context["a"], Map::new());

    // Topological ordering invariant: every edge's source completes no
    // later than its target starts.
    let a_done = execution.node_executions["a"].completed_at.unwrap();
    let b_started = execution.node_executions["b"].started_at.unwrap();
    let b_done = execution.node_executions["b"].completed_at.unwrap();
    let c_started = execution.node_executions["c"].started_at.unwrap();
    assert!(a_done <= b_started);
    assert!(b_done <= c_started);
}

#[tokio::test]
async fn s2_diamond_bounds_parallelism_and_overlaps() {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let delay = Duration::from_millis(200);
    let mut registry = SkillRegistry::new();
    for id in ["branch-b", "branch-c"] {
        let spans = spans.clone();
        registry.register(move || {
            Box::new(TimingSkill {
                definition: SkillDefinition::new(id, id, "timing probe", SkillCategory::Execution),
                delay,
                spans: spans.clone(),
            })
        });
    }

    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig { max_parallel_nodes: 2 });

    let workflow = Workflow::new("wf_s2", "diamond")
        .with_nodes(vec![
            trigger("a"),
            skill_node("b", "branch-b"),
            skill_node("c", "branch-c"),
            trigger("d"),
        ])
        .with_edges(vec![
            Edge::new("e1", "a", "b"),
            Edge::new("e2", "a", "c"),
            Edge::new("e3", "b", "d"),
            Edge::new("e4", "c", "d"),
        ])
        .with_triggers(vec!["a".to_string()]);

    let execution = runner.run(workflow, Map::new()).await;

    assert_eq!(execution.status, WorkflowStatus::Completed);
    for node_id in ["a", "b", "c", "d"] {
        assert_eq!(execution.node_executions[node_id].status, NodeStatus::Success);
    }

    let spans = spans.lock().unwrap();
    assert_eq!(spans.len(), 2);
    let (_, b_start, b_end) = &spans[0];
    let (_, c_start, c_end) = &spans[1];
    // Overlap: neither span finishes before the other one starts.
    assert!(b_start < c_end && c_start < b_end);

    let d_started = execution.node_executions["d"].started_at.unwrap();
    let b_done = execution.node_executions["b"].completed_at.unwrap();
    let c_done = execution.node_executions["c"].completed_at.unwrap();
    assert!(b_done <= d_started);
    assert!(c_done <= d_started);
}

#[tokio::test]
async fn s3_failed_node_does_not_block_downstream() {
    let mut registry = SkillRegistry::new();
    registry.register(|| Box::new(MockSkill::failing("flaky", "boom")));
    registry.register(|| Box::new(MockSkill::returning("ok", Map::new())));

    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig::default());
    let workflow = Workflow::new("wf_s3", "failure propagation")
        .with_nodes(vec![
            trigger("a"),
            skill_node("b", "flaky"),
            skill_node("c", "ok").with_parameters(
                [("passthrough".to_string(), json!(true))].into_iter().collect(),
            ),
        ])
        .with_edges(vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c")])
        .with_triggers(vec!["a".to_string()]);

    let execution = runner.run(workflow, Map::new()).await;

    assert_eq!(execution.status, WorkflowStatus::Completed);
    assert_eq!(execution.node_executions["b"].status, NodeStatus::Failed);
    assert_eq!(execution.node_executions["c"].status, NodeStatus::Success);
    // C's synthesized inputs include its own parameter plus B's (empty)
    // outputs merged in — the explicit parameter is untouched.
    assert_eq!(execution.node_executions["c"].inputs["passthrough"], json!(true));
}

#[tokio::test(start_paused = true)]
async fn s4_timeout_then_retry_exhaustion() {
    let mut registry = SkillRegistry::new();
    registry.register(|| {
        Box::new(
            MockSkill::sleeping("sleepy", Duration::from_secs(5))
                .with_definition(SkillDefinition::new("sleepy", "sleepy", "", SkillCategory::Execution).with_timeout(1).with_retries(2)),
        )
    });

    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig::default());
    let workflow = Workflow::new("wf_s4", "timeout retry")
        .with_nodes(vec![trigger("a"), skill_node("x", "sleepy")])
        .with_edges(vec![Edge::new("e1", "a", "x")])
        .with_triggers(vec!["a".to_string()]);

    let started = tokio::time::Instant::now();
    let execution = runner.run(workflow, Map::new()).await;
    let elapsed = started.elapsed();

    let x = &execution.node_executions["x"];
    assert_eq!(x.status, NodeStatus::Failed);
    assert_eq!(x.retry_count, 3);
    assert!(x.error.as_ref().unwrap().contains("timed out"));
    // Three 1s timeouts plus backoffs of 1s and 2s between them.
    assert!(elapsed >= Duration::from_secs(6), "elapsed was {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn s5_cancellation_stops_undispatched_nodes() {
    let mut registry = SkillRegistry::new();
    for id in ["first", "second", "third"] {
        registry.register(move || Box::new(MockSkill::sleeping(id, Duration::from_secs(2))));
    }

    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig::default());
    let workflow = Workflow::new("wf_s5", "chain")
        .with_nodes(vec![
            trigger("a"),
            skill_node("n1", "first"),
            skill_node("n2", "second"),
            skill_node("n3", "third"),
        ])
        .with_edges(vec![
            Edge::new("e1", "a", "n1"),
            Edge::new("e2", "n1", "n2"),
            Edge::new("e3", "n2", "n3"),
        ])
        .with_triggers(vec!["a".to_string()]);

    let (execution_id, mut rx) = runner.run_stream(workflow, Map::new()).await;

    // n1 (2s) finishes, n2 starts; cancel 1s into n2's sleep so it's
    // genuinely in flight when the signal arrives.
    tokio::time::sleep(Duration::from_secs(3)).await;
    runner.cancel(&execution_id).await;

    // Drain the stream to completion.
    while rx.recv().await.is_some() {}

    let execution = runner.get_execution(&execution_id).await.unwrap();
    assert_eq!(execution.status, WorkflowStatus::Cancelled);
    assert_eq!(execution.node_executions["n1"].status, NodeStatus::Success);
    assert_eq!(execution.node_executions["n3"].status, NodeStatus::Pending);
}

#[tokio::test]
async fn streaming_ends_with_execution_complete() {
    let registry = SkillRegistry::with_standard_skills();
    let runner = WorkflowRunner::new(Arc::new(registry), RunnerConfig::default());
    let workflow = Workflow::new("wf_stream", "stream")
        .with_nodes(vec![trigger("a"), skill_node("b", "http-request")])
        .with_edges(vec![Edge::new("e1", "a", "b")])
        .with_triggers(vec!["a".to_string()]);

    let (_id, mut rx) = runner.run_stream(workflow, Map::new()).await;
    let mut records = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }

    assert!(matches!(records.first(), Some(engine::UpdateRecord::ExecutionStart { .. })));
    assert!(matches!(records.last(), Some(engine::UpdateRecord::ExecutionComplete { .. })));
}

#[test]
fn s7_validator_reports_dangling_edge() {
    let workflow = Workflow::new("wf_s7", "dangling")
        .with_nodes(vec![trigger("x")])
        .with_edges(vec![Edge::new("e1", "x", "y")])
        .with_triggers(vec!["x".to_string()]);

    let errors = engine::validate_workflow(&workflow);
    assert!(errors.iter().any(|e| e == "Edge references unknown target: y"));
}
