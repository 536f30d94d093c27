//! SMTP delivery of progress reports.

use crate::config::SmtpConfig;
use crate::models::TaskReport;
use anyhow::{Result, anyhow};
use lettre::message::{Mailbox, Message, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(creds)
            .build();

        let from: Mailbox = config
            .username
            .parse()
            .map_err(|e| anyhow!("invalid sender address '{}': {}", config.username, e))?;

        Ok(Self { transport, from })
    }

    pub async fn send_report(&self, to: &str, report: &TaskReport) -> Result<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| anyhow!("invalid recipient address '{}': {}", to, e))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(report.subject())
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(report.render_html()),
            )?;

        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow!("failed to send progress mail to {}: {}", to, e))?;

        Ok(())
    }
}
