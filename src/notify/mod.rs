//! Notification layer
//!
//! Broadcasts per-task report fragments to an agent's update rules. Delivery
//! is best-effort: individual target failures are logged and collected, and
//! the scheduler never lets a notification failure affect a tick.

pub mod email;
pub mod webhook;

use crate::models::{AgentConfig, TaskReport, UpdateRule};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{info, warn};

pub use email::SmtpMailer;
pub use webhook::WebhookSender;

/// External notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, agent: &AgentConfig, report: &TaskReport) -> Result<()>;
}

/// Fans a report out to every update rule on the agent: mail targets get the
/// HTML progress template over SMTP, API targets get a JSON POST.
pub struct UpdateNotifier {
    mailer: Option<SmtpMailer>,
    webhooks: WebhookSender,
}

impl UpdateNotifier {
    pub fn new(smtp: Option<crate::config::SmtpConfig>) -> Result<Self> {
        let mailer = smtp.map(SmtpMailer::new).transpose()?;
        Ok(Self {
            mailer,
            webhooks: WebhookSender::new(),
        })
    }
}

#[async_trait]
impl Notifier for UpdateNotifier {
    async fn notify(&self, agent: &AgentConfig, report: &TaskReport) -> Result<()> {
        let mut failures: Vec<String> = Vec::new();

        for update in &agent.updates {
            let outcome = match update {
                UpdateRule::Api { endpoint } => self.webhooks.post_report(endpoint, report).await,
                UpdateRule::Mail { to } => match &self.mailer {
                    Some(mailer) => mailer.send_report(to, report).await,
                    None => {
                        warn!(to = %to, "mail update target skipped: SMTP not configured");
                        continue;
                    }
                },
            };

            match outcome {
                Ok(()) => {
                    info!(
                        agent_id = %agent.id,
                        task_type = %report.task_type,
                        "progress report delivered"
                    );
                }
                Err(err) => {
                    warn!(
                        agent_id = %agent.id,
                        task_type = %report.task_type,
                        error = %err,
                        "progress report delivery failed"
                    );
                    failures.push(err.to_string());
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "notification delivery failed for {} target(s): {}",
                failures.len(),
                failures.join(" | ")
            ))
        }
    }
}
