//! Agent service layer
//!
//! Agent CRUD, the on-demand run trigger, and the status query. The status
//! path derives due/not-due from the same frequency policy the scheduler loop
//! uses, against current store state, without mutating anything.

use crate::AppCore;
use crate::engine::policy;
use crate::error::AgentError;
use crate::models::{AgentConfig, Frequency};
use crate::storage::MemoryEntry;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpcomingTask {
    pub task_type: String,
    /// `"{d} days {h} hours {m} minutes"` with zero components omitted;
    /// empty means due now.
    pub due_in: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentStatus {
    pub agent_id: String,
    pub upcoming_tasks: Vec<UpcomingTask>,
}

pub async fn create_agent(
    core: &Arc<AppCore>,
    mut config: AgentConfig,
) -> Result<AgentConfig, AgentError> {
    config.id = Uuid::new_v4().to_string();
    core.storage
        .agents
        .save(&config)
        .context("failed to persist new agent")?;
    info!(agent_id = %config.id, name = %config.persona.name, "agent created");
    Ok(config)
}

pub async fn get_agent(core: &Arc<AppCore>, id: &str) -> Result<AgentConfig, AgentError> {
    core.storage
        .agents
        .get(id)
        .with_context(|| format!("failed to load agent {}", id))?
        .ok_or_else(|| AgentError::NotFound(id.to_string()))
}

pub async fn list_agents(core: &Arc<AppCore>) -> Result<Vec<AgentConfig>, AgentError> {
    Ok(core
        .storage
        .agents
        .list()
        .context("failed to list agents")?)
}

/// Replace an existing agent's configuration. The id is immutable and taken
/// from the path, never from the payload; updating a missing id is a miss,
/// not an implicit create.
pub async fn update_agent(
    core: &Arc<AppCore>,
    id: &str,
    mut config: AgentConfig,
) -> Result<AgentConfig, AgentError> {
    if !core
        .storage
        .agents
        .exists(id)
        .with_context(|| format!("failed to check agent {}", id))?
    {
        return Err(AgentError::NotFound(id.to_string()));
    }

    config.id = id.to_string();
    core.storage
        .agents
        .save(&config)
        .with_context(|| format!("failed to update agent {}", id))?;
    Ok(config)
}

pub async fn delete_agent(core: &Arc<AppCore>, id: &str) -> Result<(), AgentError> {
    if !core
        .storage
        .agents
        .delete(id)
        .with_context(|| format!("failed to delete agent {}", id))?
    {
        return Err(AgentError::NotFound(id.to_string()));
    }

    let removed = core
        .storage
        .memory
        .clear(id)
        .with_context(|| format!("failed to clear memory ledger for agent {}", id))?;
    info!(agent_id = %id, memory_entries = removed, "agent deleted");
    Ok(())
}

/// Fire-and-forget trigger of the on-demand pass for one agent. Failures
/// after this returns are observable only through notifications and logs.
pub async fn run_agent_now(core: &Arc<AppCore>, id: &str) -> Result<(), AgentError> {
    if !core
        .storage
        .agents
        .exists(id)
        .with_context(|| format!("failed to check agent {}", id))?
    {
        return Err(AgentError::NotFound(id.to_string()));
    }

    core.scheduler_handle()
        .run_now(id)
        .await
        .context("failed to dispatch on-demand run")?;
    Ok(())
}

/// Upcoming-task listing for one agent. On-demand tasks are excluded;
/// unrecognized frequency labels are logged and omitted.
pub async fn get_status(core: &Arc<AppCore>, id: &str) -> Result<AgentStatus, AgentError> {
    let agent = get_agent(core, id).await?;
    let now = core.clock.now();

    let mut upcoming_tasks = Vec::new();
    for task in &agent.tasks {
        match &task.frequency {
            Frequency::OnDemand => continue,
            Frequency::Other(label) => {
                warn!(
                    agent_id = %id,
                    task_type = task.kind.type_name(),
                    frequency = %label,
                    "unrecognized frequency label, omitting task from status"
                );
                continue;
            }
            _ => {}
        }

        let wait = policy::time_until_due(&task.frequency, task.last_run, now);
        upcoming_tasks.push(UpcomingTask {
            task_type: task.kind.type_name().to_string(),
            due_in: policy::format_due_in(wait),
        });
    }

    Ok(AgentStatus {
        agent_id: agent.id,
        upcoming_tasks,
    })
}

/// Memory ledger contents for one agent, most recent first.
pub async fn read_memory(core: &Arc<AppCore>, id: &str) -> Result<Vec<MemoryEntry>, AgentError> {
    if !core
        .storage
        .agents
        .exists(id)
        .with_context(|| format!("failed to check agent {}", id))?
    {
        return Err(AgentError::NotFound(id.to_string()));
    }

    Ok(core
        .storage
        .memory
        .read_all(id)
        .with_context(|| format!("failed to read memory ledger for agent {}", id))?)
}
