use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_stream::wrappers::ReceiverStream;

use engine::{UpdateRecord, WorkflowExecution, HEARTBEAT_INTERVAL_MS};

use super::workflows::engine_error_status;
use super::AppState;

#[derive(Deserialize, Default)]
pub struct ExecuteDto {
    #[serde(default)]
    pub input: Map<String, Value>,
}

pub async fn execute(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteDto>,
) -> Result<Json<WorkflowExecution>, StatusCode> {
    state
        .manager
        .run_workflow(&id, payload.input)
        .await
        .map(Json)
        .map_err(engine_error_status)
}

pub async fn execute_stream(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteDto>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let (_execution_id, rx) = state
        .manager
        .run_workflow_stream(&id, payload.input)
        .await
        .map_err(engine_error_status)?;

    let events = ReceiverStream::new(rx).map(|record: UpdateRecord| {
        let event = Event::default().json_data(&record).unwrap_or_else(|_| Event::default().data("serialization error"));
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_millis(HEARTBEAT_INTERVAL_MS))))
}

#[derive(Deserialize)]
pub struct ListExecutionsQuery {
    pub workflow_id: Option<String>,
}

pub async fn list(
    Query(query): Query<ListExecutionsQuery>,
    State(state): State<AppState>,
) -> Json<Vec<WorkflowExecution>> {
    Json(state.manager.list_executions(query.workflow_id.as_deref()).await)
}

pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> Result<Json<WorkflowExecution>, StatusCode> {
    state.manager.get_execution(&id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn cancel(Path(id): Path<String>, State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.manager.cancel_execution(&id).await {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
