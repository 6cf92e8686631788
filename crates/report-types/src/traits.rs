//! Store abstraction and error taxonomy.

use crate::{Attachment, Entry, Priority, Report, ReportPatch, ReportStatus};
use async_trait::async_trait;

/// Report store: exclusive owner of all report records for the process lifetime.
///
/// Implementations must serialize read-modify-write per record: the version check,
/// field application and version increment of `update` are atomic with respect to
/// any other mutation of the same report.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Create a report at version 1 with no entries.
    async fn create(
        &self,
        title: String,
        status: Option<ReportStatus>,
        priority: Option<Priority>,
    ) -> Result<Report, ReportStoreError>;

    /// Get a snapshot of one report.
    async fn get(&self, id: &str) -> Result<Report, ReportStoreError>;

    /// Apply a partial update under optimistic concurrency.
    async fn update(&self, id: &str, patch: &ReportPatch) -> Result<Report, ReportStoreError>;

    /// Append an entry and recompute metrics.
    async fn append_entry(
        &self,
        id: &str,
        content: String,
        priority: Option<Priority>,
    ) -> Result<Entry, ReportStoreError>;

    /// Append ingested attachment metadata; returns it unchanged.
    async fn append_attachment(
        &self,
        id: &str,
        attachment: Attachment,
    ) -> Result<Attachment, ReportStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportStoreError {
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("version conflict: current version is {current}, submitted {submitted}")]
    VersionConflict { current: u64, submitted: u64 },
}

/// Malformed payload rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation error: {0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
