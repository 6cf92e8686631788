//! In-memory report store with one lock per record.

use crate::mutator::{apply_patch, attachment_audit_line, entry_audit_line};
use chrono::Utc;
use report_types::{
    Attachment, Entry, Priority, Report, ReportPatch, ReportStatus, ReportStore, ReportStoreError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

type Record = Arc<Mutex<Report>>;

/// In-memory implementation of ReportStore (process lifetime only).
/// The map lock is held only for insert and lookup; mutations take the record's own mutex.
pub struct InMemoryReportStore {
    /// report_id -> record.
    reports: RwLock<HashMap<String, Record>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
        }
    }

    async fn record(&self, id: &str) -> Result<Record, ReportStoreError> {
        self.reports
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ReportStoreError::NotFound(id.to_string()))
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(
        &self,
        title: String,
        status: Option<ReportStatus>,
        priority: Option<Priority>,
    ) -> Result<Report, ReportStoreError> {
        let id = Uuid::new_v4().to_string();
        let report = Report::new(
            id.clone(),
            title,
            status.unwrap_or_default(),
            priority.unwrap_or_default(),
            Utc::now(),
        );
        self.reports
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(report.clone())));
        tracing::info!(report_id = %id, "report created");
        Ok(report)
    }

    async fn get(&self, id: &str) -> Result<Report, ReportStoreError> {
        let record = self.record(id).await?;
        let guard = record.lock().await;
        Ok(guard.clone())
    }

    async fn update(&self, id: &str, patch: &ReportPatch) -> Result<Report, ReportStoreError> {
        let record = self.record(id).await?;
        let mut guard = record.lock().await;
        match apply_patch(&mut guard, patch, Utc::now()) {
            Ok(changed) => {
                tracing::info!(
                    report_id = %id,
                    version = guard.version,
                    changed = ?changed,
                    "report updated"
                );
                Ok(guard.clone())
            }
            Err(e) => {
                tracing::warn!(report_id = %id, error = %e, "report update rejected");
                Err(e)
            }
        }
    }

    async fn append_entry(
        &self,
        id: &str,
        content: String,
        priority: Option<Priority>,
    ) -> Result<Entry, ReportStoreError> {
        let record = self.record(id).await?;
        let mut guard = record.lock().await;
        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            content,
            created_at: now,
            priority: priority.unwrap_or_default(),
        };
        guard.entries.push(entry.clone());
        guard.metrics = guard.live_metrics();
        guard.updated_at = now;
        guard.audit_logs.push(entry_audit_line(&entry.id, now));
        tracing::info!(report_id = %id, entry_id = %entry.id, "entry appended");
        Ok(entry)
    }

    async fn append_attachment(
        &self,
        id: &str,
        attachment: Attachment,
    ) -> Result<Attachment, ReportStoreError> {
        let record = self.record(id).await?;
        let mut guard = record.lock().await;
        let now = Utc::now();
        guard.attachments.push(attachment.clone());
        guard.updated_at = now;
        guard
            .audit_logs
            .push(attachment_audit_line(&attachment.original_name, now));
        tracing::info!(report_id = %id, filename = %attachment.filename, "attachment appended");
        Ok(attachment)
    }
}
