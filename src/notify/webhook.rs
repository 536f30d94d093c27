//! JSON webhook delivery of progress reports.

use crate::models::TaskReport;
use anyhow::{Result, anyhow};

pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_report(&self, endpoint: &str, report: &TaskReport) -> Result<()> {
        self.client
            .post(endpoint)
            .json(report)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| anyhow!("POST to {} failed: {}", endpoint, e))?;

        Ok(())
    }
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}
