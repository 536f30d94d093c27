//! Scheduler loop
//!
//! One long-lived background loop that, on a fixed interval, walks every
//! agent and runs whichever tasks the frequency policy says are due. Tasks of
//! one agent run strictly in list order, each fully completing (including
//! persistence) before the next starts; a per-agent lock keeps the periodic
//! pass and an on-demand trigger for the same agent from interleaving.
//!
//! The loop is the outermost containment boundary: nothing that goes wrong
//! inside a pass escapes to crash the process - it degrades to "log and retry
//! next interval".

use crate::engine::gateway::{HandlerContext, TaskGateway};
use crate::engine::policy::{self, Clock};
use crate::models::{TaskReport, TaskRunStatus};
use crate::notify::Notifier;
use crate::storage::Storage;
use anyhow::{Result, anyhow};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between full scans over all agents.
    pub scan_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
        }
    }
}

/// Messages for controlling the running loop.
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run the on-demand pass for one agent, bypassing the sleep.
    RunNow(String),
    /// Stop the loop at the next opportunity.
    Stop,
}

/// Handle to a running scheduler loop.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Fire-and-forget trigger of the on-demand pass for one agent.
    pub async fn run_now(&self, agent_id: impl Into<String>) -> Result<()> {
        self.command_tx
            .send(SchedulerCommand::RunNow(agent_id.into()))
            .await
            .map_err(|e| anyhow!("failed to send run-now command: {}", e))
    }

    pub async fn stop(&self) -> Result<()> {
        self.command_tx
            .send(SchedulerCommand::Stop)
            .await
            .map_err(|e| anyhow!("failed to send stop command: {}", e))
    }
}

pub struct Scheduler {
    storage: Arc<Storage>,
    gateway: Arc<TaskGateway>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    /// One lock per agent id: the same agent record must never be mutated by
    /// two concurrent passes.
    agent_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Scheduler {
    pub fn new(
        storage: Arc<Storage>,
        gateway: Arc<TaskGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            gateway,
            notifier,
            clock,
            config,
            agent_locks: DashMap::new(),
        }
    }

    /// Start the loop and return a handle for controlling it.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let scheduler = self.clone();

        tokio::spawn(async move {
            scheduler.run_loop(command_rx).await;
        });

        SchedulerHandle { command_tx }
    }

    async fn run_loop(self: Arc<Self>, mut command_rx: mpsc::Receiver<SchedulerCommand>) {
        let mut scan_interval = interval(self.config.scan_interval);

        info!(
            "scheduler started (scan_interval={:?})",
            self.config.scan_interval
        );

        loop {
            tokio::select! {
                _ = scan_interval.tick() => {
                    self.scan_all().await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RunNow(agent_id)) => {
                            debug!(agent_id = %agent_id, "on-demand run triggered");
                            let scheduler = self.clone();
                            tokio::spawn(async move {
                                if let Err(err) = scheduler.run_agent_pass(&agent_id, true).await {
                                    warn!(agent_id = %agent_id, error = %format!("{err:#}"), "on-demand pass failed");
                                }
                            });
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            break;
                        }
                    }
                }
            }
        }

        info!("scheduler stopped");
    }

    /// One full scan: load every agent and run its periodic pass. Errors are
    /// contained per agent; the scan itself never fails.
    async fn scan_all(&self) {
        let agents = match self.storage.agents.list() {
            Ok(agents) => agents,
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to list agents for scan");
                return;
            }
        };

        for agent in agents {
            if let Err(err) = self.run_agent_pass(&agent.id, false).await {
                error!(
                    agent_id = %agent.id,
                    error = %format!("{err:#}"),
                    "agent pass failed"
                );
            }
        }
    }

    /// Run one pass over a single agent's tasks.
    ///
    /// With `invoked_on_demand` set, only on-demand tasks fire; otherwise only
    /// periodic ones. On success `last_run` advances to "now", a memory entry
    /// is appended, and the agent is persisted before the next task starts.
    /// On failure `last_run` stays put so the task retries next pass, and the
    /// pass continues with the agent's remaining tasks.
    pub async fn run_agent_pass(&self, agent_id: &str, invoked_on_demand: bool) -> Result<()> {
        let lock = self.agent_lock(agent_id);
        let _guard = lock.lock().await;

        let Some(mut agent) = self.storage.agents.get(agent_id)? else {
            warn!(agent_id = %agent_id, "agent not found, skipping pass");
            return Ok(());
        };

        debug!(
            agent_id = %agent_id,
            invoked_on_demand,
            tasks = agent.tasks.len(),
            "running agent pass"
        );

        for index in 0..agent.tasks.len() {
            let task = agent.tasks[index].clone();
            let task_type = task.kind.type_name();

            if !task.frequency.is_recognized() {
                warn!(
                    agent_id = %agent_id,
                    task_type,
                    frequency = task.frequency.as_str(),
                    "unrecognized frequency label, task treated as never due"
                );
                continue;
            }

            let now = self.clock.now();
            if !policy::is_due(&task.frequency, task.last_run, now, invoked_on_demand) {
                continue;
            }

            info!(agent_id = %agent_id, task_type, "executing due task");

            let latest_memory = self
                .storage
                .memory
                .read_latest(agent_id)
                .unwrap_or_else(|err| {
                    warn!(agent_id = %agent_id, error = %err, "failed to read memory ledger");
                    None
                });
            let context = HandlerContext { latest_memory };

            match self.gateway.execute(&task, &agent, &context).await {
                Ok(result) => {
                    agent.tasks[index].last_run = Some(now);

                    let entry = format!("{} : {}", task_type, result);
                    if let Err(err) = self.storage.memory.append(agent_id, &entry) {
                        warn!(agent_id = %agent_id, error = %format!("{err:#}"), "failed to append memory entry");
                    }

                    self.storage.agents.save(&agent)?;

                    let report = TaskReport {
                        agent_id: agent.id.clone(),
                        agent_name: agent.persona.name.clone(),
                        task_type: task_type.to_string(),
                        last_run: Some(now.to_rfc3339()),
                        status: TaskRunStatus::Completed,
                        result: Some(result),
                        error: None,
                    };
                    self.send_report(&agent, &report).await;
                }
                Err(err) => {
                    warn!(agent_id = %agent_id, task_type, error = %err, "task execution failed");

                    // No last_run advancement: the task is retried next pass.
                    // Persist anyway so earlier tasks' progress is durable.
                    self.storage.agents.save(&agent)?;

                    let report = TaskReport {
                        agent_id: agent.id.clone(),
                        agent_name: agent.persona.name.clone(),
                        task_type: task_type.to_string(),
                        last_run: task.last_run.map(|ts| ts.to_rfc3339()),
                        status: TaskRunStatus::Failed,
                        result: None,
                        error: Some(err.to_string()),
                    };
                    self.send_report(&agent, &report).await;
                }
            }
        }

        // Defensive re-save once the whole pass is done.
        self.storage.agents.save(&agent)?;

        debug!(agent_id = %agent_id, "agent pass complete");
        Ok(())
    }

    async fn send_report(&self, agent: &crate::models::AgentConfig, report: &TaskReport) {
        if let Err(err) = self.notifier.notify(agent, report).await {
            warn!(
                agent_id = %agent.id,
                task_type = %report.task_type,
                error = %format!("{err:#}"),
                "notification failed"
            );
        }
    }

    fn agent_lock(&self, agent_id: &str) -> Arc<Mutex<()>> {
        self.agent_locks
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
