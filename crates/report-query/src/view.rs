//! Compact and full projections of a report.

use crate::pipeline::{query_entries, EntryQuery, Pagination};
use chrono::{DateTime, Utc};
use report_types::{Attachment, Entry, Metrics, Priority, Report, ReportQuery, ReportStatus};
use serde::Serialize;

/// Summary projection. Metrics are always computed from the live entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactView {
    pub id: String,
    pub title: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub metrics: Metrics,
    pub entry_count: usize,
    pub high_priority_rate: f64,
}

impl CompactView {
    pub fn of(report: &Report) -> Self {
        let metrics = report.live_metrics();
        Self {
            id: report.id.clone(),
            title: report.title.clone(),
            status: report.status,
            priority: report.priority,
            metrics,
            entry_count: metrics.total_entries,
            high_priority_rate: metrics.high_priority_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullView {
    pub id: String,
    pub title: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub metrics: Metrics,
    pub attachments: Vec<Attachment>,
    pub audit_logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries_pagination: Option<Pagination>,
}

impl FullView {
    /// Full projection; `entries` runs the query pipeline when given.
    pub fn of(report: &Report, entries: Option<&EntryQuery>) -> Self {
        let page = entries.map(|q| query_entries(&report.entries, q));
        let (entries, entries_pagination) = match page {
            Some(p) => (Some(p.entries), Some(p.pagination)),
            None => (None, None),
        };
        Self {
            id: report.id.clone(),
            title: report.title.clone(),
            status: report.status,
            priority: report.priority,
            created_at: report.created_at,
            updated_at: report.updated_at,
            version: report.version,
            metrics: report.live_metrics(),
            attachments: report.attachments.clone(),
            audit_logs: report.audit_logs.clone(),
            entries,
            entries_pagination,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportView {
    Compact(CompactView),
    Full(FullView),
}

/// Shape `report` according to the GET query (`view`, `include`, `entries_*`).
pub fn project(report: &Report, q: &ReportQuery) -> ReportView {
    if q.is_compact() {
        return ReportView::Compact(CompactView::of(report));
    }
    let entry_query = q.includes_entries().then(|| EntryQuery::from_query(q));
    ReportView::Full(FullView::of(report, entry_query.as_ref()))
}
