//! `api` crate — HTTP REST API layer
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   POST   /api/v1/workflows/:id/execute/stream   (SSE)
//!   POST   /api/v1/workflows/import               (n8n)
//!   POST   /api/v1/workflows/validate
//!   GET    /api/v1/executions
//!   GET    /api/v1/executions/:id
//!   POST   /api/v1/executions/:id/cancel

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use engine::WorkflowManager;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

pub async fn serve(bind: &str, manager: Arc<WorkflowManager>) -> Result<(), std::io::Error> {
    let state = AppState { manager };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/import", post(handlers::workflows::import))
        .route("/workflows/validate", post(handlers::workflows::validate))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute))
        .route("/workflows/:id/execute/stream", post(handlers::executions::execute_stream))
        .route("/executions", get(handlers::executions::list))
        .route("/executions/:id", get(handlers::executions::get))
        .route("/executions/:id/cancel", post(handlers::executions::cancel));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
