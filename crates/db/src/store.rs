//! In-memory workflow store.
//!
//! Generalized from the teacher's sqlx/Postgres repository functions:
//! same function-per-operation shape (`save`, `get`, `delete`, `list`),
//! same `DbError` taxonomy, but backed by a `Mutex<HashMap>` instead of
//! a connection pool. The workspace's Non-goals rule out durable
//! persistence, so there is nothing left for a SQL crate to do here —
//! every operation below is infallible except for lookups by an id that
//! was never saved.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::error::DbError;
use crate::models::WorkflowRow;

#[derive(Default)]
pub struct WorkflowStore {
    workflows: Mutex<HashMap<String, WorkflowRow>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a row. `created_at` is preserved across an
    /// overwrite if the caller supplies the same value it read back;
    /// the store itself does not infer "is this an update" — the
    /// caller (the `engine` crate's workflow manager) owns that logic.
    pub fn save(&self, row: WorkflowRow) -> WorkflowRow {
        let mut workflows = self.workflows.lock().expect("workflow store lock poisoned");
        workflows.insert(row.id.clone(), row.clone());
        row
    }

    pub fn get(&self, id: &str) -> Result<WorkflowRow, DbError> {
        self.workflows
            .lock()
            .expect("workflow store lock poisoned")
            .get(id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    /// Delete a row. Returns `DbError::NotFound` if no row had that id.
    pub fn delete(&self, id: &str) -> Result<(), DbError> {
        let mut workflows = self.workflows.lock().expect("workflow store lock poisoned");
        workflows.remove(id).map(|_| ()).ok_or(DbError::NotFound)
    }

    /// All rows, newest first.
    pub fn list(&self) -> Vec<WorkflowRow> {
        let mut rows: Vec<WorkflowRow> = self
            .workflows
            .lock()
            .expect("workflow store lock poisoned")
            .values()
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

/// Convenience for building a fresh row at save time.
pub fn new_row(id: String, name: String, definition: serde_json::Value, created_at: Option<chrono::DateTime<Utc>>) -> WorkflowRow {
    let now = Utc::now();
    WorkflowRow {
        id,
        name,
        definition,
        created_at: created_at.unwrap_or(now),
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_then_get_round_trips() {
        let store = WorkflowStore::new();
        let row = new_row("wf_1".into(), "demo".into(), json!({"nodes": []}), None);
        store.save(row);

        let fetched = store.get("wf_1").unwrap();
        assert_eq!(fetched.name, "demo");
    }

    #[test]
    fn get_missing_id_returns_not_found() {
        let store = WorkflowStore::new();
        assert!(matches!(store.get("ghost"), Err(DbError::NotFound)));
    }

    #[test]
    fn delete_removes_the_row() {
        let store = WorkflowStore::new();
        store.save(new_row("wf_1".into(), "demo".into(), json!({}), None));
        store.delete("wf_1").unwrap();
        assert!(matches!(store.get("wf_1"), Err(DbError::NotFound)));
    }

    #[test]
    fn delete_missing_id_returns_not_found() {
        let store = WorkflowStore::new();
        assert!(matches!(store.delete("ghost"), Err(DbError::NotFound)));
    }

    #[test]
    fn list_orders_newest_first() {
        let store = WorkflowStore::new();
        let older = new_row("a".into(), "a".into(), json!({}), Some(Utc::now() - chrono::Duration::seconds(60)));
        let newer = new_row("b".into(), "b".into(), json!({}), None);
        store.save(older);
        store.save(newer);

        let rows = store.list();
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[1].id, "a");
    }
}
