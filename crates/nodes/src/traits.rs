//! The `Skill` trait — the contract every unit of work must fulfil.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, SkillResult};
use crate::definition::SkillDefinition;

/// The core skill trait.
///
/// Every skill — built-in or plugin — implements this. There is no
/// inheritance here: each skill is a distinct concrete type, and the
/// registry dispatches to it purely through this trait object.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Static, idempotent metadata about this skill.
    fn definition(&self) -> &SkillDefinition;

    /// Human-readable validation errors: one per missing required
    /// parameter, one per value outside a closed `allowed_values` set.
    /// Unknown keys are permitted for forward-compatibility.
    fn validate_inputs(&self, inputs: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();
        for param in &self.definition().parameters {
            let Some(value) = inputs.get(&param.name) else {
                if param.required {
                    errors.push(format!("missing required parameter: {}", param.name));
                }
                continue;
            };
            if let Some(allowed) = &param.allowed_values {
                if !allowed.contains(value) {
                    errors.push(format!(
                        "parameter '{}' has value not in the allowed set",
                        param.name
                    ));
                }
            }
        }
        errors
    }

    /// Run the skill. Must never raise to the scheduler — any internal
    /// failure is surfaced as `SkillResult { status: Failed, .. }`. The
    /// scheduler enforces the timeout externally and does not trust the
    /// skill's own timing.
    async fn execute(&self, ctx: &ExecutionContext) -> SkillResult;
}

/// Produces a fresh [`Skill`] instance. The registry stores factories,
/// not shared instances, so every invocation gets its own skill object
/// per the execution contract.
pub trait SkillFactory: Send + Sync {
    fn create(&self) -> Box<dyn Skill>;
}

impl<F> SkillFactory for F
where
    F: Fn() -> Box<dyn Skill> + Send + Sync,
{
    fn create(&self) -> Box<dyn Skill> {
        (self)()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::standard::StandardSkill;
    use crate::traits::Skill;

    fn http_request() -> StandardSkill {
        let registry = crate::registry::SkillRegistry::with_standard_skills();
        let skill = registry.get("http-request").unwrap();
        StandardSkill::new(skill.definition().clone())
    }

    #[test]
    fn missing_required_parameter_is_reported() {
        let skill = http_request();
        let inputs = serde_json::Map::new();
        let errors = skill.validate_inputs(&inputs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("url"));
    }

    #[test]
    fn value_outside_allowed_set_is_reported() {
        let skill = http_request();
        let mut inputs = serde_json::Map::new();
        inputs.insert("url".to_string(), json!("https://example.com"));
        inputs.insert("method".to_string(), json!("TRACE"));
        let errors = skill.validate_inputs(&inputs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("method"));
    }

    #[test]
    fn unknown_keys_are_permitted() {
        let skill = http_request();
        let mut inputs = serde_json::Map::new();
        inputs.insert("url".to_string(), json!("https://example.com"));
        inputs.insert("unexpected_field".to_string(), json!(42));
        let errors = skill.validate_inputs(&inputs);
        assert!(errors.is_empty());
    }
}
