use agentflow::AppCore;
use agentflow::api;
use agentflow::config::AppConfig;
use agentflow::engine::gateway::{HandlerContext, HandlerRegistry, TaskHandler};
use agentflow::models::{AgentConfig, Task, TaskType};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Placeholder handler wired for every task kind until a deployment registers
/// the real content pipeline. Acknowledges the task without side effects.
struct DryRunHandler;

#[async_trait]
impl TaskHandler for DryRunHandler {
    async fn run(
        &self,
        task: &Task,
        agent: &AgentConfig,
        context: &HandlerContext,
    ) -> Result<String> {
        info!(
            task_type = task.kind.type_name(),
            agent = %agent.persona.name,
            has_context = context.latest_memory.is_some(),
            "dry-run handler invoked"
        );
        Ok(format!(
            "{} acknowledged for {}",
            task.kind.type_name(),
            agent.persona.name
        ))
    }
}

fn default_registry() -> HandlerRegistry {
    let handler: Arc<dyn TaskHandler> = Arc::new(DryRunHandler);
    let mut registry = HandlerRegistry::new();
    for task_type in TaskType::ALL {
        registry.register(task_type, handler.clone());
    }
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    info!(
        db_path = %config.db_path,
        scan_interval = ?config.scan_interval,
        smtp_configured = config.smtp.is_some(),
        "starting agentflow"
    );

    let core = Arc::new(AppCore::new(&config, default_registry())?);
    let app = api::router(core);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("agentflow listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
