//! Skill metadata — the immutable description of a unit of work.
//!
//! A [`SkillDefinition`] never changes after registration; it is the
//! contract the scheduler and any authoring tool reason about without
//! needing a live instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default timeout applied to a skill when none is specified.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Broad grouping used by the registry's `list_by_category` and by any
/// authoring UI that wants to bucket the palette of available skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Cognitive,
    Web,
    Execution,
    Integration,
}

/// One input a skill accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl SkillParameter {
    pub fn required(name: impl Into<String>, param_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            allowed_values: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: impl Into<String>, description: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: Some(default),
            allowed_values: None,
        }
    }

    pub fn with_allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

/// One output a skill may produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillOutput {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: String,
    pub description: String,
}

impl SkillOutput {
    pub fn new(name: impl Into<String>, output_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_type: output_type.into(),
            description: description.into(),
        }
    }
}

/// Immutable metadata describing a skill. Registered once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: SkillCategory,
    pub parameters: Vec<SkillParameter>,
    pub outputs: Vec<SkillOutput>,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    pub icon: String,
    pub color: String,
}

impl SkillDefinition {
    /// Builder-style constructor with the spec's defaults
    /// (`timeout_seconds = 300`, `retry_count = 0`) pre-filled.
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, category: SkillCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            parameters: Vec::new(),
            outputs: Vec::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_count: 0,
            icon: String::new(),
            color: String::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<SkillParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<SkillOutput>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}
