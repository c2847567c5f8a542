//! Row structs persisted by the store.
//!
//! These are *persistence* models — they carry no domain behaviour. The
//! `engine` crate owns the domain `Workflow` type and serializes into
//! and out of `definition` here; keeping the dependency this direction
//! (rather than `db` depending on `engine`) avoids a cycle since `engine`
//! depends on `db` for `WorkflowStore`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted workflow definition row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRow {
    pub id: String,
    pub name: String,
    /// Full JSON workflow definition (nodes, edges, triggers, settings).
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
