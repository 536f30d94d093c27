//! Task execution gateway
//!
//! Uniform dispatch from a task's declared kind to its registered handler.
//! Handler results and failures are normalized into a single shape here; a
//! failing or hung handler never propagates past this boundary uncaught.

use crate::models::{AgentConfig, Task, TaskType};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Continuity context handed to a handler alongside the task.
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    /// Most recent memory ledger entry for the agent, when one exists.
    pub latest_memory: Option<String>,
}

/// External collaborator that performs one kind of task.
///
/// Side effects (content generation, scraping, sending mail) live behind this
/// trait; the gateway treats them as opaque.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(
        &self,
        task: &Task,
        agent: &AgentConfig,
        context: &HandlerContext,
    ) -> Result<String>;
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no handler registered for task type '{0}'")]
    UnknownTaskType(String),
    #[error("handler for '{task_type}' failed: {source}")]
    Handler {
        task_type: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("handler for '{task_type}' timed out after {timeout_secs}s")]
    Timeout { task_type: String, timeout_secs: u64 },
}

/// Mapping from task type to its handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(task_type, handler);
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

pub struct TaskGateway {
    registry: HandlerRegistry,
    task_timeout: Duration,
}

impl TaskGateway {
    pub fn new(registry: HandlerRegistry, task_timeout: Duration) -> Self {
        Self {
            registry,
            task_timeout,
        }
    }

    /// Execute one task through its registered handler.
    ///
    /// A timeout counts as a retryable failure; callers must not advance
    /// `last_run` on any error so the task is retried on the next pass.
    pub async fn execute(
        &self,
        task: &Task,
        agent: &AgentConfig,
        context: &HandlerContext,
    ) -> Result<String, TaskError> {
        let task_type = task.kind.task_type();
        let handler = self
            .registry
            .get(task_type)
            .ok_or_else(|| TaskError::UnknownTaskType(task_type.as_str().to_string()))?;

        match tokio::time::timeout(self.task_timeout, handler.run(task, agent, context)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(source)) => Err(TaskError::Handler {
                task_type: task_type.as_str().to_string(),
                source,
            }),
            Err(_) => Err(TaskError::Timeout {
                task_type: task_type.as_str().to_string(),
                timeout_secs: self.task_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, Persona, TaskKind};
    use anyhow::anyhow;

    struct EchoHandler;

    #[async_trait]
    impl TaskHandler for EchoHandler {
        async fn run(
            &self,
            task: &Task,
            _agent: &AgentConfig,
            context: &HandlerContext,
        ) -> Result<String> {
            Ok(format!(
                "{} ran (context: {})",
                task.kind.type_name(),
                context.latest_memory.as_deref().unwrap_or("none")
            ))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl TaskHandler for FailingHandler {
        async fn run(
            &self,
            _task: &Task,
            _agent: &AgentConfig,
            _context: &HandlerContext,
        ) -> Result<String> {
            Err(anyhow!("upstream unavailable"))
        }
    }

    struct HangingHandler;

    #[async_trait]
    impl TaskHandler for HangingHandler {
        async fn run(
            &self,
            _task: &Task,
            _agent: &AgentConfig,
            _context: &HandlerContext,
        ) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("unreachable".to_string())
        }
    }

    fn test_agent() -> AgentConfig {
        AgentConfig {
            id: "agent-001".to_string(),
            persona: Persona {
                name: "Morgan".to_string(),
                description: String::new(),
                qualities: String::new(),
            },
            documents: vec![],
            tasks: vec![],
            updates: vec![],
        }
    }

    fn post_creator_task() -> Task {
        Task::new(
            TaskKind::PostCreator {
                topic: "launch".to_string(),
                platform: "instagram".to_string(),
            },
            Frequency::Daily,
        )
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::PostCreator, Arc::new(EchoHandler));
        let gateway = TaskGateway::new(registry, Duration::from_secs(5));

        let context = HandlerContext {
            latest_memory: Some("post_creator : drafted 1 post".to_string()),
        };
        let result = gateway
            .execute(&post_creator_task(), &test_agent(), &context)
            .await
            .unwrap();
        assert!(result.contains("post_creator ran"));
        assert!(result.contains("drafted 1 post"));
    }

    #[tokio::test]
    async fn missing_handler_is_an_unknown_task_type_failure() {
        let gateway = TaskGateway::new(HandlerRegistry::new(), Duration::from_secs(5));

        let err = gateway
            .execute(&post_creator_task(), &test_agent(), &HandlerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownTaskType(ref t) if t == "post_creator"));
    }

    #[tokio::test]
    async fn unknown_wire_data_is_an_unknown_task_type_failure() {
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::PostCreator, Arc::new(EchoHandler));
        let gateway = TaskGateway::new(registry, Duration::from_secs(5));

        let task = Task::new(TaskKind::Unknown, Frequency::Daily);
        let err = gateway
            .execute(&task, &test_agent(), &HandlerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownTaskType(ref t) if t == "unknown"));
    }

    #[tokio::test]
    async fn handler_error_is_contained() {
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::PostCreator, Arc::new(FailingHandler));
        let gateway = TaskGateway::new(registry, Duration::from_secs(5));

        let err = gateway
            .execute(&post_creator_task(), &test_agent(), &HandlerContext::default())
            .await
            .unwrap_err();
        match err {
            TaskError::Handler { task_type, source } => {
                assert_eq!(task_type, "post_creator");
                assert!(source.to_string().contains("upstream unavailable"));
            }
            other => panic!("expected handler error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn hung_handler_times_out() {
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::PostCreator, Arc::new(HangingHandler));
        let gateway = TaskGateway::new(registry, Duration::from_millis(50));

        let err = gateway
            .execute(&post_creator_task(), &test_agent(), &HandlerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Timeout { .. }));
    }
}
