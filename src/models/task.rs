//! Task models
//!
//! A task is one schedulable unit of work: a kind with its parameter payload,
//! a recurrence frequency, and the timestamp of its last successful run.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence label governing when a task is due.
///
/// Unrecognized labels are carried verbatim in `Other` so that a record
/// written by a newer version still loads; such tasks are never due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    OnDemand,
    Hourly,
    SixHourly,
    Daily,
    Monthly,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::OnDemand => "on-demand",
            Frequency::Hourly => "hourly",
            Frequency::SixHourly => "6-hourly",
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
            Frequency::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "on-demand" => Frequency::OnDemand,
            "hourly" => Frequency::Hourly,
            "6-hourly" => Frequency::SixHourly,
            "daily" => Frequency::Daily,
            "monthly" => Frequency::Monthly,
            other => Frequency::Other(other.to_string()),
        }
    }

    /// Recurrence period. `None` for on-demand and unrecognized labels.
    ///
    /// A month is a fixed 30 days, not calendar-aware.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Frequency::Hourly => Some(Duration::hours(1)),
            Frequency::SixHourly => Some(Duration::hours(6)),
            Frequency::Daily => Some(Duration::days(1)),
            Frequency::Monthly => Some(Duration::days(30)),
            Frequency::OnDemand | Frequency::Other(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Frequency::Other(_))
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Frequency::from_label(&label))
    }
}

/// Fieldless discriminant of a task kind, used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    SeoOptimizer,
    CompetitorWatchdog,
    ProductRecommendation,
    PostCreator,
    SmartEmailManager,
    MeetingSummarizer,
    CustomerFeedbackAnalyzer,
    ContractSummarizer,
    AiResearchAssistant,
    RegulatoryComplianceWatchdog,
    /// Forward-compatible wire data with an unknown `type` tag.
    Unknown,
}

impl TaskType {
    /// Every dispatchable task type (excludes `Unknown`).
    pub const ALL: [TaskType; 10] = [
        TaskType::SeoOptimizer,
        TaskType::CompetitorWatchdog,
        TaskType::ProductRecommendation,
        TaskType::PostCreator,
        TaskType::SmartEmailManager,
        TaskType::MeetingSummarizer,
        TaskType::CustomerFeedbackAnalyzer,
        TaskType::ContractSummarizer,
        TaskType::AiResearchAssistant,
        TaskType::RegulatoryComplianceWatchdog,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskType::SeoOptimizer => "seo_optimizer",
            TaskType::CompetitorWatchdog => "competitor_watchdog",
            TaskType::ProductRecommendation => "product_recommendation",
            TaskType::PostCreator => "post_creator",
            TaskType::SmartEmailManager => "smart_email_manager",
            TaskType::MeetingSummarizer => "meeting_summarizer",
            TaskType::CustomerFeedbackAnalyzer => "customer_feedback_analyzer",
            TaskType::ContractSummarizer => "contract_summarizer",
            TaskType::AiResearchAssistant => "ai_research_assistant",
            TaskType::RegulatoryComplianceWatchdog => "regulatory_compliance_watchdog",
            TaskType::Unknown => "unknown",
        }
    }
}

/// Task kind with its per-variant parameter payload.
///
/// The payload is opaque to the scheduler; only the registered handler for
/// the kind interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    SeoOptimizer {
        keywords: Vec<String>,
        content: String,
    },
    CompetitorWatchdog {
        websites: Vec<String>,
    },
    ProductRecommendation {
        products: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_data_source: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uploaded_csv_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company_pdf_path: Option<String>,
    },
    PostCreator {
        topic: String,
        platform: String,
    },
    SmartEmailManager {
        action: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tone: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_inclusions: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word_limit: Option<u32>,
    },
    MeetingSummarizer {
        source_url: String,
    },
    CustomerFeedbackAnalyzer {
        product_name: String,
        feedback_source: String,
    },
    ContractSummarizer {
        source_url: String,
        domain_type: String,
    },
    AiResearchAssistant {
        research_topics: Vec<String>,
        #[serde(default)]
        data_sources: Vec<String>,
    },
    RegulatoryComplianceWatchdog {
        keywords: Vec<String>,
        regulatory_bodies: Vec<String>,
    },
    /// Defensive fallback: an unknown `type` tag loads as this marker instead
    /// of failing the whole agent record. Execution always fails with an
    /// unknown-task-type error and the original payload does not round-trip.
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskKind::SeoOptimizer { .. } => TaskType::SeoOptimizer,
            TaskKind::CompetitorWatchdog { .. } => TaskType::CompetitorWatchdog,
            TaskKind::ProductRecommendation { .. } => TaskType::ProductRecommendation,
            TaskKind::PostCreator { .. } => TaskType::PostCreator,
            TaskKind::SmartEmailManager { .. } => TaskType::SmartEmailManager,
            TaskKind::MeetingSummarizer { .. } => TaskType::MeetingSummarizer,
            TaskKind::CustomerFeedbackAnalyzer { .. } => TaskType::CustomerFeedbackAnalyzer,
            TaskKind::ContractSummarizer { .. } => TaskType::ContractSummarizer,
            TaskKind::AiResearchAssistant { .. } => TaskType::AiResearchAssistant,
            TaskKind::RegulatoryComplianceWatchdog { .. } => {
                TaskType::RegulatoryComplianceWatchdog
            }
            TaskKind::Unknown => TaskType::Unknown,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.task_type().as_str()
    }
}

/// One schedulable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(flatten)]
    pub kind: TaskKind,
    pub frequency: Frequency,
    /// Set to "now" by the scheduler after each successful execution; absent
    /// until the first run. Persists as an RFC 3339 string.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_rfc3339"
    )]
    pub last_run: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(kind: TaskKind, frequency: Frequency) -> Self {
        Self {
            kind,
            frequency,
            last_run: None,
        }
    }
}

/// RFC 3339 (de)serialization for `last_run` that degrades instead of failing:
/// an unparseable stored value loads as `None` (task becomes due immediately)
/// and is logged as a corrupt record.
mod lenient_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| match DateTime::parse_from_rfc3339(&value) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(err) => {
                tracing::warn!(
                    value = %value,
                    error = %err,
                    "corrupt last_run timestamp, treating task as never run"
                );
                None
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_labels_round_trip() {
        for label in ["on-demand", "hourly", "6-hourly", "daily", "monthly"] {
            let frequency = Frequency::from_label(label);
            assert!(frequency.is_recognized());
            assert_eq!(frequency.as_str(), label);

            let json = serde_json::to_string(&frequency).unwrap();
            let back: Frequency = serde_json::from_str(&json).unwrap();
            assert_eq!(back, frequency);
        }
    }

    #[test]
    fn unrecognized_frequency_is_preserved_verbatim() {
        let frequency: Frequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(frequency, Frequency::Other("weekly".to_string()));
        assert!(!frequency.is_recognized());
        assert!(frequency.period().is_none());
        assert_eq!(serde_json::to_string(&frequency).unwrap(), "\"weekly\"");
    }

    #[test]
    fn frequency_periods() {
        assert_eq!(Frequency::Hourly.period(), Some(Duration::hours(1)));
        assert_eq!(Frequency::SixHourly.period(), Some(Duration::hours(6)));
        assert_eq!(Frequency::Daily.period(), Some(Duration::hours(24)));
        assert_eq!(Frequency::Monthly.period(), Some(Duration::days(30)));
        assert_eq!(Frequency::OnDemand.period(), None);
    }

    #[test]
    fn task_serializes_with_inline_type_tag() {
        let task = Task::new(
            TaskKind::CompetitorWatchdog {
                websites: vec!["https://example.com".to_string()],
            },
            Frequency::Daily,
        );

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], "competitor_watchdog");
        assert_eq!(value["frequency"], "daily");
        assert!(value.get("last_run").is_none());

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn task_round_trips_last_run() {
        let mut task = Task::new(
            TaskKind::MeetingSummarizer {
                source_url: "https://example.com/recording".to_string(),
            },
            Frequency::Hourly,
        );
        task.last_run = Some(Utc::now());

        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_run, task.last_run);
    }

    #[test]
    fn corrupt_last_run_loads_as_absent() {
        let json = r#"{
            "type": "seo_optimizer",
            "keywords": ["rust"],
            "content": "post",
            "frequency": "hourly",
            "last_run": "2025-01-15 10:30:00.123456"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.last_run, None);
        assert_eq!(task.frequency, Frequency::Hourly);
    }

    #[test]
    fn unknown_task_type_loads_as_marker() {
        let json = r#"{
            "type": "stock_screener",
            "tickers": ["ACME"],
            "frequency": "daily"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.kind, TaskKind::Unknown);
        assert_eq!(task.kind.type_name(), "unknown");
        assert_eq!(task.frequency, Frequency::Daily);
    }

    #[test]
    fn task_type_names_cover_all_variants() {
        assert_eq!(TaskType::ALL.len(), 10);
        for task_type in TaskType::ALL {
            assert_ne!(task_type.as_str(), "unknown");
        }
    }
}
