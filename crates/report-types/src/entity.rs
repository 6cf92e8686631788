//! Report entity and its nested records (entries, attachments, metrics).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Submitted,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority shared by reports and entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Ordinal used for sorting: low=1, medium=2, high=3.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped, prioritized sub-record of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
}

/// Counts derived from a report's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_entries: usize,
    pub high_priority_entries: usize,
}

impl Metrics {
    /// Compute metrics from an entry collection.
    pub fn from_entries(entries: &[Entry]) -> Self {
        Self {
            total_entries: entries.len(),
            high_priority_entries: entries
                .iter()
                .filter(|e| e.priority == Priority::High)
                .count(),
        }
    }

    /// Share of high-priority entries; 0.0 when there are no entries.
    pub fn high_priority_rate(&self) -> f64 {
        if self.total_entries == 0 {
            return 0.0;
        }
        self.high_priority_entries as f64 / self.total_entries as f64
    }
}

/// Metadata of an uploaded file, as produced by attachment ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Storage-assigned unique name.
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    pub url: String,
}

/// Full report record as owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub audit_logs: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Report {
    /// New report at version 1 with no entries.
    pub fn new(
        id: String,
        title: String,
        status: ReportStatus,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            status,
            priority,
            created_at: now,
            updated_at: now,
            version: 1,
            entries: Vec::new(),
            metrics: Metrics::default(),
            audit_logs: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Metrics computed from the current entries (ignores the stored field).
    pub fn live_metrics(&self) -> Metrics {
        Metrics::from_entries(&self.entries)
    }
}
