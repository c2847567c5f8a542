//! `MockSkill` — a test double for [`Skill`].
//!
//! Useful in runner and manager tests where a real skill implementation
//! is either unavailable or irrelevant to the behavior under test.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, SkillResult};
use crate::definition::{SkillCategory, SkillDefinition};
use crate::traits::Skill;

/// Behaviour injected into `MockSkill` at construction time.
#[derive(Clone)]
pub enum MockBehaviour {
    /// Succeed with the given outputs.
    Succeed(Map<String, Value>),
    /// Fail, carrying the given error message.
    Fail(String),
    /// Sleep for the given duration, then succeed with empty outputs —
    /// used to exercise the runner's timeout envelope.
    Sleep(Duration),
}

/// A mock skill that records every invocation it receives and returns a
/// programmer-specified result.
pub struct MockSkill {
    definition: SkillDefinition,
    behaviour: MockBehaviour,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSkill {
    fn new(id: &str, behaviour: MockBehaviour) -> Self {
        Self {
            definition: SkillDefinition::new(id, id, "mock skill", SkillCategory::Execution),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_definition(mut self, definition: SkillDefinition) -> Self {
        self.definition = definition;
        self
    }

    pub fn returning(id: &str, outputs: Map<String, Value>) -> Self {
        Self::new(id, MockBehaviour::Succeed(outputs))
    }

    pub fn failing(id: &str, message: impl Into<String>) -> Self {
        Self::new(id, MockBehaviour::Fail(message.into()))
    }

    pub fn sleeping(id: &str, duration: Duration) -> Self {
        Self::new(id, MockBehaviour::Sleep(duration))
    }

    /// Number of times this skill has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Skill for MockSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ExecutionContext) -> SkillResult {
        self.calls.lock().unwrap().push(ctx.node_id.clone());

        match &self.behaviour {
            MockBehaviour::Succeed(outputs) => SkillResult::success(outputs.clone(), 0),
            MockBehaviour::Fail(message) => SkillResult::failure(message.clone(), 0),
            MockBehaviour::Sleep(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(*duration) => {}
                    _ = ctx.cancellation.cancelled() => {}
                }
                SkillResult::success(Map::new(), duration.as_millis() as u64)
            }
        }
    }
}
