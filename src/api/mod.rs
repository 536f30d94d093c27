//! HTTP surface over the agent service layer.

pub mod agents;
pub mod error;

use crate::AppCore;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub fn router(core: Arc<AppCore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agents", post(agents::create_agent).get(agents::list_agents))
        .route(
            "/api/agents/{id}",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        .route("/api/agents/{id}/run", post(agents::run_agent))
        .route("/api/agents/{id}/status", get(agents::agent_status))
        .route("/api/agents/{id}/memory", get(agents::agent_memory))
        .layer(CorsLayer::permissive())
        .with_state(core)
}
