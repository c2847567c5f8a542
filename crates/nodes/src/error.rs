//! Error type for skill resolution.
//!
//! Execution failures are *not* represented here — the contract forbids
//! a skill from raising to the scheduler (see [`crate::traits::Skill`]);
//! they are carried instead as data inside [`crate::context::SkillResult`].
//! This type only covers failures that happen before a skill even runs.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodesError {
    #[error("skill not found: {0}")]
    SkillNotFound(String),
}
