//! Agent models
//!
//! An agent bundles a persona, reference documents, a task list, and the
//! notification targets its task results are broadcast to.

use crate::models::Task;
use serde::{Deserialize, Serialize};

/// Display identity of an agent, free text throughout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub qualities: String,
}

/// A named reference document available to task handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRef {
    pub name: String,
    pub path: String,
}

/// Notification target consumed when broadcasting a task result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateRule {
    /// JSON POST of the report to an HTTP endpoint.
    Api { endpoint: String },
    /// HTML progress mail to an address.
    Mail { to: String },
}

/// Durable per-agent record.
///
/// `id` is assigned at creation and immutable thereafter. Task order is the
/// execution order within one scheduling pass; `Task::last_run` is the only
/// field the scheduler mutates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub id: String,
    pub persona: Persona,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub updates: Vec<UpdateRule>,
}
