//! The skill registry — a process-wide mapping from skill id to a
//! factory producing fresh instances.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::definition::{SkillCategory, SkillDefinition};
use crate::error::NodesError;
use crate::traits::{Skill, SkillFactory};

/// Holds skill factories keyed by id. Effectively read-only after
/// startup registration; safe to share behind an `Arc`.
pub struct SkillRegistry {
    factories: HashMap<String, Arc<dyn SkillFactory>>,
    /// Insertion order, since `HashMap` doesn't preserve one and
    /// `list_all` must return skills in registration order.
    order: Vec<String>,
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a skill factory. Last write wins on a duplicate id.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Skill> + Send + Sync + 'static,
    {
        let probe = factory();
        let id = probe.definition().id.clone();
        info!(skill_id = %id, "registering skill");
        if !self.factories.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.factories.insert(id, Arc::new(factory));
    }

    /// Returns a fresh instance of the requested skill, or `None` if no
    /// such skill is registered.
    pub fn get(&self, skill_id: &str) -> Option<Box<dyn Skill>> {
        self.factories.get(skill_id).map(|f| f.create())
    }

    /// Same as [`Self::get`], but with a typed error the caller can
    /// propagate instead of having to invent its own "not found" string.
    pub fn resolve(&self, skill_id: &str) -> Result<Box<dyn Skill>, NodesError> {
        self.get(skill_id).ok_or_else(|| NodesError::SkillNotFound(skill_id.to_string()))
    }

    /// All registered skill definitions, in registration order.
    pub fn list_all(&self) -> Vec<SkillDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.factories.get(id))
            .map(|f| f.create().definition().clone())
            .collect()
    }

    /// Registered skill definitions in the given category, in
    /// registration order.
    pub fn list_by_category(&self, category: SkillCategory) -> Vec<SkillDefinition> {
        self.list_all()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSkill;
    use serde_json::Map;

    #[test]
    fn standard_registry_seeds_eleven_skills() {
        let registry = SkillRegistry::with_standard_skills();
        assert_eq!(registry.list_all().len(), 11);
    }

    #[test]
    fn list_all_preserves_registration_order() {
        let mut registry = SkillRegistry::new();
        registry.register(|| Box::new(MockSkill::returning("first", Map::new())));
        registry.register(|| Box::new(MockSkill::returning("second", Map::new())));
        registry.register(|| Box::new(MockSkill::returning("third", Map::new())));

        let ids: Vec<String> = registry.list_all().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_is_last_write_wins_but_keeps_original_slot() {
        let mut registry = SkillRegistry::new();
        registry.register(|| Box::new(MockSkill::failing("dup", "first version")));
        registry.register(|| Box::new(MockSkill::returning("dup", Map::new())));

        assert_eq!(registry.list_all().len(), 1);
        let skill = registry.get("dup").expect("should resolve");
        assert_eq!(skill.definition().id, "dup");
    }

    #[test]
    fn get_returns_a_fresh_instance_each_call() {
        let mut registry = SkillRegistry::new();
        registry.register(|| Box::new(MockSkill::returning("echo", Map::new())));

        let a = registry.get("echo").unwrap();
        let b = registry.get("echo").unwrap();
        assert_eq!(a.definition().id, b.definition().id);
    }

    #[test]
    fn get_missing_skill_returns_none() {
        let registry = SkillRegistry::new();
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn resolve_missing_skill_returns_typed_error() {
        let registry = SkillRegistry::new();
        let err = registry.resolve("nonexistent").err().expect("should fail to resolve");
        assert_eq!(err, NodesError::SkillNotFound("nonexistent".to_string()));
    }

    #[test]
    fn list_by_category_filters() {
        let registry = SkillRegistry::with_standard_skills();
        let web = registry.list_by_category(SkillCategory::Web);
        assert!(web.iter().any(|d| d.id == "http-request"));
        assert!(!web.iter().any(|d| d.id == "bash-commander"));
    }
}
