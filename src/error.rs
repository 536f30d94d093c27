//! Service-level error types.

use thiserror::Error;

/// Errors surfaced by the agent service layer.
///
/// `NotFound` is a typed miss the API boundary maps to 404; everything else
/// is internal.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
