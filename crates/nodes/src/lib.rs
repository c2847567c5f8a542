//! `nodes` crate — the skill registry and execution contract.
//!
//! Every skill — built-in or plugin — implements [`Skill`]. The
//! scheduler in the `engine` crate dispatches execution through this
//! trait object and never knows about concrete skill types.

pub mod context;
pub mod definition;
pub mod error;
pub mod mock;
pub mod registry;
pub mod standard;
pub mod traits;

pub use context::{ExecutionContext, SkillResult, SkillStatus};
pub use definition::{SkillCategory, SkillDefinition, SkillOutput, SkillParameter};
pub use error::NodesError;
pub use registry::SkillRegistry;
pub use traits::{Skill, SkillFactory};
