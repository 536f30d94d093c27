use crate::AppCore;
use crate::api::error::ApiError;
use crate::models::AgentConfig;
use crate::services::agent::{self, AgentStatus};
use crate::storage::MemoryEntry;
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use std::sync::Arc;

// POST /api/agents
pub async fn create_agent(
    State(core): State<Arc<AppCore>>,
    Json(config): Json<AgentConfig>,
) -> Result<Json<AgentConfig>, ApiError> {
    Ok(Json(agent::create_agent(&core, config).await?))
}

// GET /api/agents
pub async fn list_agents(
    State(core): State<Arc<AppCore>>,
) -> Result<Json<Vec<AgentConfig>>, ApiError> {
    Ok(Json(agent::list_agents(&core).await?))
}

// GET /api/agents/{id}
pub async fn get_agent(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
) -> Result<Json<AgentConfig>, ApiError> {
    Ok(Json(agent::get_agent(&core, &id).await?))
}

// PUT /api/agents/{id}
pub async fn update_agent(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
    Json(config): Json<AgentConfig>,
) -> Result<Json<AgentConfig>, ApiError> {
    Ok(Json(agent::update_agent(&core, &id, config).await?))
}

// DELETE /api/agents/{id}
pub async fn delete_agent(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    agent::delete_agent(&core, &id).await?;
    Ok(Json(json!({"message": format!("Agent {} deleted", id)})))
}

// POST /api/agents/{id}/run
pub async fn run_agent(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    agent::run_agent_now(&core, &id).await?;
    Ok(Json(json!({
        "message": format!("Agent {} execution has been scheduled", id)
    })))
}

// GET /api/agents/{id}/status
pub async fn agent_status(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    Ok(Json(agent::get_status(&core, &id).await?))
}

// GET /api/agents/{id}/memory
pub async fn agent_memory(
    State(core): State<Arc<AppCore>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MemoryEntry>>, ApiError> {
    Ok(Json(agent::read_memory(&core, &id).await?))
}
