//! Application configuration.
//!
//! Environment variables are read here, once, at startup. Collaborators that
//! need credentials (the SMTP mailer) receive the constructed config object;
//! nothing reads the environment ad hoc inside business logic.

use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub bind_addr: String,
    /// Pause between full scheduler scans.
    pub scan_interval: Duration,
    /// Upper bound on a single task execution.
    pub task_timeout: Duration,
    /// Mail credentials; mail update targets are skipped when unset.
    pub smtp: Option<SmtpConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "agentflow.db".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            scan_interval: Duration::from_secs(60),
            task_timeout: Duration::from_secs(300),
            smtp: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let smtp = match (env::var("SMTP_SERVER"), env::var("EMAIL_ADDRESS"), env::var("EMAIL_PASSWORD")) {
            (Ok(server), Ok(username), Ok(password)) => Some(SmtpConfig {
                server,
                port: parse_env("SMTP_PORT", 587),
                username,
                password,
            }),
            _ => None,
        };

        Self {
            db_path: env::var("AGENTFLOW_DB_PATH").unwrap_or(defaults.db_path),
            bind_addr: env::var("AGENTFLOW_BIND_ADDR").unwrap_or(defaults.bind_addr),
            scan_interval: Duration::from_secs(parse_env(
                "AGENTFLOW_SCAN_INTERVAL_SECS",
                defaults.scan_interval.as_secs(),
            )),
            task_timeout: Duration::from_secs(parse_env(
                "AGENTFLOW_TASK_TIMEOUT_SECS",
                defaults.task_timeout.as_secs(),
            )),
            smtp,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
