use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use engine::{EngineError, Workflow};

use super::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.manager.list_workflows())
}

pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> Result<Json<Workflow>, StatusCode> {
    state.manager.get_workflow(&id).map(Json).map_err(engine_error_status)
}

pub async fn create(
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> (StatusCode, Json<Workflow>) {
    let saved = state.manager.save_workflow(workflow);
    (StatusCode::CREATED, Json(saved))
}

pub async fn delete(Path(id): Path<String>, State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state.manager.delete_workflow(&id).map(|_| StatusCode::NO_CONTENT).map_err(engine_error_status)
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub execution_order: Vec<String>,
}

pub async fn validate(Json(workflow): Json<Workflow>) -> Json<ValidationResponse> {
    let errors = engine::validate_workflow(&workflow);
    let execution_order = if errors.is_empty() {
        engine::get_execution_order(&workflow).unwrap_or_default()
    } else {
        Vec::new()
    };
    Json(ValidationResponse { valid: errors.is_empty(), errors, execution_order })
}

pub async fn import(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<(StatusCode, Json<Workflow>), StatusCode> {
    let workflow = importer::convert(&document).map_err(|err| {
        tracing::warn!(%err, "n8n import failed");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    let saved = state.manager.save_workflow(workflow);
    Ok((StatusCode::CREATED, Json(saved)))
}

pub(super) fn engine_error_status(err: EngineError) -> StatusCode {
    match err {
        EngineError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
